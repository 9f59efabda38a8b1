//! 流量工具命令
//!
//! iperf3 与 ping 的命令行构造；工具本身是外部黑盒进程。

use std::net::Ipv4Addr;
use std::path::PathBuf;

use super::HostCommand;
use crate::scenario::CongestionControl;

/// iperf3
pub struct Iperf3;

impl Iperf3 {
    /// `iperf3 -s -i <interval>`
    pub fn server(interval_secs: u64, output: PathBuf) -> HostCommand {
        HostCommand {
            argv: vec![
                "iperf3".into(),
                "-s".into(),
                "-i".into(),
                interval_secs.to_string(),
            ],
            output,
        }
    }

    /// `iperf3 -c <target> -t <duration> -C <cc>`
    pub fn client(
        target: Ipv4Addr,
        duration_secs: u64,
        cc: &CongestionControl,
        output: PathBuf,
    ) -> HostCommand {
        HostCommand {
            argv: vec![
                "iperf3".into(),
                "-c".into(),
                target.to_string(),
                "-t".into(),
                duration_secs.to_string(),
                "-C".into(),
                cc.as_str().to_string(),
            ],
            output,
        }
    }
}

/// ping（用来间接测量瓶颈排队时延）
pub struct Ping;

impl Ping {
    /// `ping <target> -i <interval> -c <count>`
    pub fn probe(target: Ipv4Addr, interval_secs: f64, count: u32, output: PathBuf) -> HostCommand {
        HostCommand {
            argv: vec![
                "ping".into(),
                target.to_string(),
                "-i".into(),
                interval_secs.to_string(),
                "-c".into(),
                count.to_string(),
            ],
            output,
        }
    }
}
