//! 仿真引擎接口
//!
//! 真正的包转发/虚拟交换机仿真由外部引擎完成；这里只定义编排器与它交互的边界，
//! 以及一个只做校验与记录的 [`DryRunEngine`]。

mod dry_run;
mod handle;
mod reset;
mod traffic;

pub use dry_run::DryRunEngine;
pub use handle::{FlowHandle, FlowTask};
pub use reset::{CommandReset, EnvironmentReset, NoopReset};
pub use traffic::{Iperf3, Ping};

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::net::{Node, Topology};

/// 引擎侧错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine rejected topology: {0}")]
    Rejected(String),
    #[error("network is not running")]
    NotRunning,
    #[error("unknown host {0}")]
    UnknownHost(String),
    #[error("failed to launch on {host}: {reason}")]
    Launch { host: String, reason: String },
}

/// 在某台虚拟主机上后台执行的命令，stdout 重定向到 `output`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostCommand {
    pub argv: Vec<String>,
    pub output: PathBuf,
}

impl HostCommand {
    /// `argv > output &` 形式的 shell 行
    pub fn shell_line(&self) -> String {
        format!("{} > {} &", self.argv.join(" "), self.output.display())
    }
}

/// 一对主机之间的探测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingResult {
    pub src: String,
    pub dst: String,
    pub reachable: bool,
}

/// 全对探测报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub results: Vec<PingResult>,
}

impl ConnectivityReport {
    pub fn sent(&self) -> usize {
        self.results.len()
    }

    pub fn received(&self) -> usize {
        self.results.iter().filter(|r| r.reachable).count()
    }

    /// 丢失百分比；没有探测时为 0
    pub fn dropped_percent(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        100.0 * (self.sent() - self.received()) as f64 / self.sent() as f64
    }

    pub fn unreachable(&self) -> impl Iterator<Item = &PingResult> {
        self.results.iter().filter(|r| !r.reachable)
    }
}

/// 外部仿真引擎
pub trait EmulationEngine {
    /// 按拓扑（含整形描述符）实例化网络
    fn start(&mut self, topo: &Topology) -> Result<(), EngineError>;

    /// 停止仿真网络
    fn stop(&mut self);

    /// 按名字查找运行中的节点
    fn node(&self, name: &str) -> Option<&Node>;

    /// 所有主机两两互 ping
    fn ping_all(&mut self) -> ConnectivityReport;

    /// 在主机上后台启动命令。返回 `Some` 表示引擎能报告任务完成情况。
    fn launch(
        &mut self,
        host: &str,
        cmd: &HostCommand,
    ) -> Result<Option<Box<dyn FlowTask>>, EngineError>;
}
