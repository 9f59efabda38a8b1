//! 实验场景
//!
//! FlowSpec / ScenarioTimeline 的声明与校验、输出文件命名、实验配置，
//! 以及驱动整个实验的编排器。

mod config;
mod flow;
mod orchestrator;
mod plan;
mod report;
mod sink;
mod timeline;

pub use config::ExperimentConfig;
pub use flow::{CongestionControl, FlowSpec, ProbeSpec, ServerSpec};
pub use orchestrator::ScenarioOrchestrator;
pub use plan::{LinkShapingPlan, PlannedLaunch, ScenarioPlan, plan_scenario};
pub use report::{ConnectivityWarning, LaunchRecord, ScenarioReport, ScenarioState};
pub use sink::{OutputSink, Role};
pub use timeline::{ScenarioTimeline, ServerLaunch};
