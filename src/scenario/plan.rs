//! 场景计划
//!
//! 不接触引擎，把一次运行会做的事情（拓扑、整形命令、启动顺序）展开成可序列化的值。

use serde::Serialize;

use super::config::ExperimentConfig;
use super::orchestrator::{launch_dest, prepare_launch};
use super::sink::Role;
use crate::engine::Iperf3;
use crate::error::ExperimentError;
use crate::net::Topology;
use crate::shaping::ShapingDescriptor;
use crate::topo::build_parking_lot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkShapingPlan {
    /// 如 `s1-s2`
    pub link: String,
    pub descriptor: ShapingDescriptor,
    /// 链路一端接口上的 tc 命令
    pub tc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedLaunch {
    pub offset_secs: f64,
    pub host: String,
    pub role: Role,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioPlan {
    pub name: String,
    pub topology: Topology,
    pub shaping: Vec<LinkShapingPlan>,
    /// 服务端在前（偏移 0），其余按启动顺序
    pub launches: Vec<PlannedLaunch>,
    pub scenario_duration_secs: f64,
}

/// 展开一份配置；校验规则与实际运行相同。
pub fn plan_scenario(cfg: &ExperimentConfig) -> Result<ScenarioPlan, ExperimentError> {
    let lot = build_parking_lot(&cfg.topology_opts()?)?;
    let timeline = cfg.timeline()?;
    timeline.check_hosts(&lot.topology)?;
    let topo = &lot.topology;
    let dir = cfg.artifact_dir.as_path();

    let shaping = topo
        .bottlenecks()
        .filter_map(|l| {
            let desc = l.shaping.clone()?;
            let a = &topo.node(l.a)?.name;
            let b = &topo.node(l.b)?.name;
            Some(LinkShapingPlan {
                link: format!("{a}-{b}"),
                tc: desc.tc_commands(&format!("{a}-eth{}", l.id.0)),
                descriptor: desc,
            })
        })
        .collect();

    let mut launches: Vec<PlannedLaunch> = timeline
        .servers()
        .iter()
        .map(|s| PlannedLaunch {
            offset_secs: 0.0,
            host: s.host.clone(),
            role: Role::Server,
            command: Iperf3::server(s.spec.interval_secs, s.sink.path_in(dir)).shell_line(),
        })
        .collect();
    for item in timeline.order() {
        let launch = item.launch();
        let target = launch_dest(&timeline, launch)
            .and_then(|d| topo.node_by_name(d))
            .and_then(|n| n.ip);
        let Some(p) = target.and_then(|t| prepare_launch(&timeline, launch, t, dir)) else {
            continue;
        };
        launches.push(PlannedLaunch {
            offset_secs: item.at().as_secs_f64(),
            host: p.host,
            role: p.sink.role,
            command: p.command.shell_line(),
        });
    }

    Ok(ScenarioPlan {
        name: cfg.name.clone(),
        topology: lot.topology.clone(),
        shaping,
        launches,
        scenario_duration_secs: timeline.scenario_duration_secs(),
    })
}
