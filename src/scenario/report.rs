//! 场景报告

use std::path::PathBuf;

use serde::Serialize;

use super::sink::Role;
use crate::engine::ConnectivityReport;

/// 编排状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Idle,
    TopologyBuilt,
    NetworkStarted,
    ConnectivityVerified,
    FlowsRunning,
    Torndown,
}

/// 探测不通的一对主机；只记录，不阻止场景继续。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityWarning {
    pub src: String,
    pub dst: String,
}

/// 一次启动请求的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchRecord {
    /// 相对流阶段开始的实际发起时刻（秒）
    pub at_secs: f64,
    pub host: String,
    pub role: Role,
    pub artifact: PathBuf,
    pub command: String,
    /// 引擎拒绝时的原因
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub states: Vec<ScenarioState>,
    /// (host, switch)
    pub connections: Vec<(String, String)>,
    pub connectivity: ConnectivityReport,
    pub warnings: Vec<ConnectivityWarning>,
    pub launches: Vec<LaunchRecord>,
    /// 拆除时仍未完成的输出（可能被截断）
    pub possibly_truncated: Vec<PathBuf>,
    pub scenario_duration_secs: f64,
}

impl ScenarioReport {
    pub fn final_state(&self) -> Option<ScenarioState> {
        self.states.last().copied()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.launches
            .iter()
            .filter(|l| l.error.is_none())
            .map(|l| &l.artifact)
    }
}
