//! 链路整形（Link shaping）
//!
//! 把实验参数（带宽、时延、丢包率、队列深度）翻译成两条瓶颈链路的整形描述符，
//! 并拒绝不一致的取值。

mod delay;
mod descriptor;

pub use delay::{Delay, DelayParseError};
pub use descriptor::{ShapingDescriptor, TokenBucket};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExperimentError;

pub const DEFAULT_PKT_BYTES: u64 = 1500;

pub fn mem_from_pkt(pkts: u64) -> u64 {
    pkts.saturating_mul(DEFAULT_PKT_BYTES)
}

/// 一条链路的原始整形参数（未校验）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapingParams {
    pub bandwidth_mbps: f64,
    pub delay: String,
    pub loss_percent: f64,
    pub queue_packets: i64,
}

/// 两条瓶颈链路共享带宽/丢包/队列，时延可以不同。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckConfig {
    pub bandwidth_mbps: f64,
    /// [S1–S2, S2–S3]
    pub delays: [String; 2],
    #[serde(default)]
    pub loss_percent: f64,
    pub queue_packets: i64,
}

impl BottleneckConfig {
    pub fn link_params(&self, idx: usize) -> ShapingParams {
        ShapingParams {
            bandwidth_mbps: self.bandwidth_mbps,
            delay: self.delays[idx].clone(),
            loss_percent: self.loss_percent,
            queue_packets: self.queue_packets,
        }
    }
}

/// 整形器：只做参数翻译与校验。
pub struct LinkShaper;

impl LinkShaper {
    /// 校验一条链路的参数并生成描述符
    pub fn shape(params: &ShapingParams) -> Result<ShapingDescriptor, ExperimentError> {
        let bw = params.bandwidth_mbps;
        if !bw.is_finite() || bw <= 0.0 {
            return Err(ExperimentError::config(format!(
                "bandwidth must be a positive number of Mbps, got {bw}"
            )));
        }
        let delay: Delay = params
            .delay
            .parse()
            .map_err(|e: DelayParseError| ExperimentError::config(e.to_string()))?;
        let loss = params.loss_percent;
        if !(0.0..=100.0).contains(&loss) {
            return Err(ExperimentError::config(format!(
                "loss must be within [0, 100] percent, got {loss}"
            )));
        }
        let queue = params.queue_packets;
        if queue <= 0 || queue > u32::MAX as i64 {
            return Err(ExperimentError::config(format!(
                "queue capacity must be a positive number of packets, got {queue}"
            )));
        }
        let queue_packets = queue as u32;

        let desc = ShapingDescriptor {
            bandwidth_mbps: bw,
            delay,
            loss_percent: loss,
            queue_packets,
            token_bucket: TokenBucket {
                rate_bps: (bw * 1e6).round() as u64,
                burst_packets: queue_packets,
            },
        };
        debug!(bandwidth_mbps = bw, %delay, loss_percent = loss, queue_packets, "生成整形描述符");
        Ok(desc)
    }

    /// 为 S1–S2 与 S2–S3 生成恰好两个描述符
    pub fn bottlenecks(cfg: &BottleneckConfig) -> Result<[ShapingDescriptor; 2], ExperimentError> {
        Ok([
            Self::shape(&cfg.link_params(0))?,
            Self::shape(&cfg.link_params(1))?,
        ])
    }
}
