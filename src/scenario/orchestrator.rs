//! 场景编排
//!
//! `Idle → TopologyBuilt → NetworkStarted → ConnectivityVerified → FlowsRunning → Torndown`
//!
//! 单线程：只发出启动请求，然后在偏移之间睡眠。流本身由引擎在各虚拟主机上并行运行，
//! 完成与否只按经过的时间推断。

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::config::ExperimentConfig;
use super::report::{ConnectivityWarning, LaunchRecord, ScenarioReport, ScenarioState};
use super::sink::{OutputSink, Role};
use super::timeline::ScenarioTimeline;
use crate::engine::{EmulationEngine, EnvironmentReset, FlowHandle, HostCommand, Iperf3, Ping};
use crate::error::ExperimentError;
use crate::net::Topology;
use crate::sim::{Clock, Launch, SimTime};
use crate::topo::build_parking_lot;

/// 时间线上一次客户端/探测启动的完整描述
#[derive(Debug, Clone)]
pub(crate) struct PreparedLaunch {
    pub host: String,
    pub sink: OutputSink,
    pub command: HostCommand,
    pub duration_secs: f64,
}

/// 为 `launch` 构造命令；`target` 是目的主机地址。
pub(crate) fn prepare_launch(
    timeline: &ScenarioTimeline,
    launch: Launch,
    target: Ipv4Addr,
    dir: &Path,
) -> Option<PreparedLaunch> {
    let sink = timeline.sink_for(launch)?;
    let path = sink.path_in(dir);
    match launch {
        Launch::Flow(i) => {
            let f = timeline.flows().get(i)?;
            Some(PreparedLaunch {
                host: f.source.clone(),
                command: Iperf3::client(target, f.run_secs(), &f.congestion, path),
                sink,
                duration_secs: f.run_secs() as f64,
            })
        }
        Launch::Probe(i) => {
            let p = timeline.probes().get(i)?;
            Some(PreparedLaunch {
                host: p.source.clone(),
                command: Ping::probe(target, p.interval_secs, p.count, path),
                sink,
                duration_secs: p.duration_secs(),
            })
        }
    }
}

/// 启动目标主机名
pub(crate) fn launch_dest(timeline: &ScenarioTimeline, launch: Launch) -> Option<&str> {
    match launch {
        Launch::Flow(i) => timeline.flows().get(i).map(|f| f.dest.as_str()),
        Launch::Probe(i) => timeline.probes().get(i).map(|p| p.dest.as_str()),
    }
}

/// 场景编排器
pub struct ScenarioOrchestrator<'a> {
    config: &'a ExperimentConfig,
    engine: &'a mut dyn EmulationEngine,
    reset: &'a mut dyn EnvironmentReset,
    clock: &'a mut dyn Clock,
    states: Vec<ScenarioState>,
}

impl<'a> ScenarioOrchestrator<'a> {
    pub fn new(
        config: &'a ExperimentConfig,
        engine: &'a mut dyn EmulationEngine,
        reset: &'a mut dyn EnvironmentReset,
        clock: &'a mut dyn Clock,
    ) -> Self {
        Self {
            config,
            engine,
            reset,
            clock,
            states: vec![ScenarioState::Idle],
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.states
            .last()
            .copied()
            .unwrap_or(ScenarioState::Idle)
    }

    fn transition(&mut self, to: ScenarioState) {
        info!(from = ?self.state(), ?to, "🔁 场景状态迁移");
        self.states.push(to);
    }

    /// 运行完整场景。
    ///
    /// 配置和调度错误在接触引擎之前返回；引擎拒绝拓扑时直接返回，不做拆除；
    /// 网络一旦启动，无论中途出现什么警告都会拆除。
    #[tracing::instrument(skip(self), fields(name = %self.config.name, n = self.config.n))]
    pub fn run(mut self) -> Result<ScenarioReport, ExperimentError> {
        let opts = self.config.topology_opts()?;
        let timeline = self.config.timeline()?;
        let lot = build_parking_lot(&opts)?;
        timeline.check_hosts(&lot.topology)?;
        self.transition(ScenarioState::TopologyBuilt);

        self.reset.reset();
        if let Err(e) = self.engine.start(&lot.topology) {
            error!(error = %e, "❌ 引擎拒绝拓扑，场景中止");
            return Err(ExperimentError::TopologyInstantiation(e));
        }
        self.transition(ScenarioState::NetworkStarted);

        let connections = lot.topology.connections();
        for (host, switch) in &connections {
            debug!(%host, %switch, "主机连接");
        }

        info!("📡 全对连通性探测");
        let connectivity = self.engine.ping_all();
        let warnings: Vec<ConnectivityWarning> = connectivity
            .unreachable()
            .map(|r| {
                warn!(src = %r.src, dst = %r.dst, "⚠️  主机不可达，继续运行");
                ConnectivityWarning {
                    src: r.src.clone(),
                    dst: r.dst.clone(),
                }
            })
            .collect();
        info!(
            sent = connectivity.sent(),
            received = connectivity.received(),
            dropped_percent = connectivity.dropped_percent(),
            "连通性探测完成"
        );
        self.transition(ScenarioState::ConnectivityVerified);

        self.transition(ScenarioState::FlowsRunning);
        let (launches, possibly_truncated) = self.run_timeline(&timeline, &lot.topology);

        self.engine.stop();
        self.transition(ScenarioState::Torndown);

        Ok(ScenarioReport {
            name: self.config.name.clone(),
            states: self.states,
            connections,
            connectivity,
            warnings,
            launches,
            possibly_truncated,
            scenario_duration_secs: timeline.scenario_duration_secs(),
        })
    }

    /// 启动服务端，再按偏移依次启动客户端/探测，最后睡到场景结束。
    fn run_timeline(
        &mut self,
        timeline: &ScenarioTimeline,
        topo: &Topology,
    ) -> (Vec<LaunchRecord>, Vec<PathBuf>) {
        let config = self.config;
        let dir = config.artifact_dir.as_path();
        let t0 = self.clock.now();
        let mut records = Vec::new();
        let mut handles = Vec::new();

        for server in timeline.servers() {
            let cmd = Iperf3::server(server.spec.interval_secs, server.sink.path_in(dir));
            info!(host = %server.host, artifact = %server.sink, "🎧 启动服务端");
            self.launch(t0, &server.host, server.sink.clone(), cmd, None, &mut records);
        }

        for item in timeline.order() {
            self.clock.sleep_until(t0.saturating_add(item.at()));
            let launch = item.launch();

            let target = launch_dest(timeline, launch).and_then(|dest| {
                self.engine
                    .node(dest)
                    .or_else(|| topo.node_by_name(dest))
                    .and_then(|n| n.ip)
            });
            let Some(target) = target else {
                warn!(?launch, "目的主机没有地址，跳过");
                continue;
            };
            let Some(p) = prepare_launch(timeline, launch, target, dir) else {
                continue;
            };
            info!(
                host = %p.host,
                offset_secs = item.at().as_secs_f64(),
                duration_secs = p.duration_secs,
                artifact = %p.sink,
                "🚀 启动"
            );
            let duration = Some(SimTime::from_secs_f64(p.duration_secs));
            let handle = self.launch(t0, &p.host, p.sink, p.command, duration, &mut records);
            handles.extend(handle);
        }

        let end = t0.saturating_add(timeline.scenario_duration());
        debug!(end_secs = end.as_secs_f64(), "等待场景结束");
        // 逐个等到预期结束（不超过场景结束），剩下的在宽限期后再看一次
        let pending: Vec<&FlowHandle> = handles
            .iter()
            .filter(|h| {
                let remaining = end.saturating_sub(self.clock.now());
                !h.join(remaining, &mut *self.clock)
            })
            .collect();
        self.clock.sleep_until(end);

        let now = self.clock.now();
        let truncated = pending
            .into_iter()
            .filter(|h| !h.is_complete(now))
            .map(|h| {
                warn!(
                    host = %h.host,
                    artifact = %h.sink,
                    "⚠️  拆除时流可能尚未结束，输出可能被截断"
                );
                h.sink.path_in(dir)
            })
            .collect();
        (records, truncated)
    }

    /// 发起一次启动；引擎拒绝只记录警告。
    fn launch(
        &mut self,
        t0: SimTime,
        host: &str,
        sink: OutputSink,
        cmd: HostCommand,
        duration: Option<SimTime>,
        records: &mut Vec<LaunchRecord>,
    ) -> Option<FlowHandle> {
        let now = self.clock.now();
        let role = sink.role;
        let result = self.engine.launch(host, &cmd);
        let error = result.as_ref().err().map(|e| {
            warn!(host, error = %e, "⚠️  启动失败，继续运行");
            e.to_string()
        });
        records.push(LaunchRecord {
            at_secs: now.saturating_sub(t0).as_secs_f64(),
            host: host.to_string(),
            role,
            artifact: cmd.output.clone(),
            command: cmd.shell_line(),
            error,
        });
        let task = result.ok()?;
        if role == Role::Server {
            return None;
        }
        let expected_end = duration.map(|d| now.saturating_add(d));
        Some(FlowHandle::new(host, sink, now, expected_end, task))
    }
}
