//! 实验配置
//!
//! 一次运行的全部参数。构建后不可变，显式传给拓扑构建、整形和时间线。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::flow::{CongestionControl, FlowSpec, ProbeSpec, ServerSpec};
use super::timeline::ScenarioTimeline;
use crate::error::ExperimentError;
use crate::shaping::{BottleneckConfig, LinkShaper, ShapingDescriptor};
use crate::topo::ParkingLotOpts;

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub name: String,
    pub n: i64,
    pub bottleneck: BottleneckConfig,
    #[serde(default)]
    pub grace_secs: f64,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub probes: Vec<ProbeSpec>,
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
    /// 附加到所有输出文件名末尾的变体标记
    #[serde(default)]
    pub variant: Option<String>,
}

impl ExperimentConfig {
    pub const PRESETS: [&'static str; 3] = ["connectivity", "staggered", "competing"];

    /// 内置场景
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "connectivity" => Some(Self::connectivity()),
            "staggered" => Some(Self::staggered()),
            "competing" => Some(Self::competing()),
            _ => None,
        }
    }

    /// 只建网并做连通性检查
    pub fn connectivity() -> Self {
        Self {
            name: "connectivity".into(),
            n: 3,
            bottleneck: BottleneckConfig {
                bandwidth_mbps: 50.0,
                delays: ["0ms".into(), "10ms".into()],
                loss_percent: 0.0,
                queue_packets: 1000,
            },
            grace_secs: 0.0,
            flows: Vec::new(),
            probes: Vec::new(),
            artifact_dir: default_artifact_dir(),
            variant: None,
        }
    }

    /// h8→h1 先发，10 秒后 h8→h4 加入，两条流跨越不同数量的瓶颈
    pub fn staggered() -> Self {
        let total = 100.0;
        Self {
            name: "staggered".into(),
            grace_secs: 3.0,
            flows: vec![
                FlowSpec::new("h8", "h1", CongestionControl::Bbr, 0.0, total, "flow1"),
                FlowSpec::new("h8", "h4", CongestionControl::Bbr, 10.0, total - 10.0, "flow2"),
            ],
            ..Self::connectivity()
        }
    }

    /// h1 同时向 h6 (cubic) 与 h7 (bbr) 发送，浅队列，h3→h8 ping 测排队时延
    pub fn competing() -> Self {
        let total = 200.0;
        let queue = 50;
        let server = ServerSpec {
            label: "logs_4".into(),
            interval_secs: 1,
        };
        Self {
            name: "competing".into(),
            n: 3,
            bottleneck: BottleneckConfig {
                bandwidth_mbps: 50.0,
                delays: ["10ms".into(), "10ms".into()],
                loss_percent: 0.0,
                queue_packets: queue,
            },
            grace_secs: 40.0,
            flows: vec![
                FlowSpec::new("h1", "h6", CongestionControl::Cubic, 0.0, total, "logs_4")
                    .with_server(server.clone()),
                FlowSpec::new("h1", "h7", CongestionControl::Bbr, 0.0, total, "logs_4")
                    .with_server(server),
            ],
            probes: vec![ProbeSpec {
                source: "h3".into(),
                dest: "h8".into(),
                count: 200,
                interval_secs: 1.0,
                start_offset_secs: 0.0,
                output_label: "4".into(),
            }],
            artifact_dir: default_artifact_dir(),
            variant: Some(queue.to_string()),
        }
    }

    /// 从 JSON 文件加载
    pub fn from_json_file(path: &Path) -> Result<Self, ExperimentError> {
        let raw = fs::read_to_string(path).map_err(|source| ExperimentError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&raw).map_err(|source| ExperimentError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), name = %cfg.name, "已加载实验配置");
        Ok(cfg)
    }

    pub fn bottleneck_shaping(&self) -> Result<[ShapingDescriptor; 2], ExperimentError> {
        LinkShaper::bottlenecks(&self.bottleneck)
    }

    pub fn topology_opts(&self) -> Result<ParkingLotOpts, ExperimentError> {
        Ok(ParkingLotOpts {
            n: self.n,
            bottlenecks: self.bottleneck_shaping()?,
        })
    }

    pub fn timeline(&self) -> Result<ScenarioTimeline, ExperimentError> {
        ScenarioTimeline::schedule(
            self.flows.clone(),
            self.probes.clone(),
            self.grace_secs,
            self.variant.clone(),
        )
    }
}
