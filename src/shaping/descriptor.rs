//! 整形描述符
//!
//! 交给外部仿真引擎的声明式整形参数：HTB 令牌桶限速 + netem 时延/丢包/队列。
//! 本 crate 不实现整形本身。

use serde::{Deserialize, Serialize};

use super::delay::Delay;
use super::mem_from_pkt;

/// 令牌桶参数：速率上限与突发容量。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBucket {
    pub rate_bps: u64,
    /// 突发容量（包），等于队列深度
    pub burst_packets: u32,
}

impl TokenBucket {
    pub fn burst_bytes(&self) -> u64 {
        mem_from_pkt(self.burst_packets as u64)
    }
}

/// 一条瓶颈链路的整形描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapingDescriptor {
    pub bandwidth_mbps: f64,
    /// 单向时延；路径 RTT 为沿途时延之和的两倍
    pub delay: Delay,
    /// 独立的逐包丢弃概率（百分比）
    pub loss_percent: f64,
    /// 队列深度（包），超过后尾丢弃
    pub queue_packets: u32,
    pub token_bucket: TokenBucket,
}

impl ShapingDescriptor {
    /// 逐包丢弃概率，[0, 1]
    pub fn drop_probability(&self) -> f64 {
        self.loss_percent / 100.0
    }

    /// 该描述符在一个接口上对应的 `tc` 命令（HTB 根 + netem 子队列）。
    pub fn tc_commands(&self, dev: &str) -> Vec<String> {
        let mut netem = format!("tc qdisc add dev {dev} parent 5:1 handle 10: netem");
        if self.delay != Delay::ZERO {
            netem.push_str(&format!(" delay {}", self.delay));
        }
        if self.loss_percent > 0.0 {
            netem.push_str(&format!(" loss {}%", self.loss_percent));
        }
        netem.push_str(&format!(" limit {}", self.queue_packets));

        vec![
            format!("tc qdisc add dev {dev} root handle 5:0 htb default 1"),
            format!(
                "tc class add dev {dev} parent 5:0 classid 5:1 htb rate {}Mbit burst {}b",
                self.bandwidth_mbps,
                self.token_bucket.burst_bytes()
            ),
            netem,
        ]
    }
}
