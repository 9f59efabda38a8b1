//! 场景时间线
//!
//! 校验一组 FlowSpec / ProbeSpec，推导每个目的主机上的服务端，
//! 并给出确定的启动顺序：偏移升序，同偏移按声明顺序（流在前，探测在后）。

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::flow::{FlowSpec, ProbeSpec, ServerSpec};
use super::sink::{OutputSink, Role};
use crate::error::ExperimentError;
use crate::net::Topology;
use crate::sim::{Launch, LaunchQueue, ScheduledLaunch, SimTime};

/// 某目的主机上的 iperf3 服务端，整个场景只启动一次，且先于所有客户端。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerLaunch {
    pub host: String,
    pub spec: ServerSpec,
    pub sink: OutputSink,
}

/// 校验后的时间线
#[derive(Debug, Clone)]
pub struct ScenarioTimeline {
    flows: Vec<FlowSpec>,
    probes: Vec<ProbeSpec>,
    grace_secs: f64,
    variant: Option<String>,
    servers: Vec<ServerLaunch>,
    order: Vec<ScheduledLaunch>,
}

fn check_offset(what: &str, offset: f64) -> Result<(), ExperimentError> {
    if !offset.is_finite() || offset < 0.0 {
        return Err(ExperimentError::conflict(format!(
            "{what}: start offset must be >= 0, got {offset}"
        )));
    }
    Ok(())
}

fn check_endpoints(what: &str, source: &str, dest: &str) -> Result<(), ExperimentError> {
    if source == dest {
        return Err(ExperimentError::conflict(format!(
            "{what}: source and destination are both {source}"
        )));
    }
    Ok(())
}

impl ScenarioTimeline {
    /// 校验并排定时间线
    #[tracing::instrument(
        skip_all,
        fields(flows = flows.len(), probes = probes.len(), grace_secs = grace_secs)
    )]
    pub fn schedule(
        flows: Vec<FlowSpec>,
        probes: Vec<ProbeSpec>,
        grace_secs: f64,
        variant: Option<String>,
    ) -> Result<Self, ExperimentError> {
        if !grace_secs.is_finite() || grace_secs < 0.0 {
            return Err(ExperimentError::config(format!(
                "grace period must be >= 0 seconds, got {grace_secs}"
            )));
        }

        for (i, f) in flows.iter().enumerate() {
            let what = format!("flow #{i} ({})", f.output_label);
            check_offset(&what, f.start_offset_secs)?;
            if !f.duration_secs.is_finite() || f.duration_secs <= 0.0 {
                return Err(ExperimentError::conflict(format!(
                    "{what}: duration must be > 0, got {}",
                    f.duration_secs
                )));
            }
            check_endpoints(&what, &f.source, &f.dest)?;
        }
        for (i, p) in probes.iter().enumerate() {
            let what = format!("probe #{i} ({})", p.output_label);
            check_offset(&what, p.start_offset_secs)?;
            if p.count == 0 || !p.interval_secs.is_finite() || p.interval_secs <= 0.0 {
                return Err(ExperimentError::conflict(format!(
                    "{what}: needs count > 0 and interval > 0"
                )));
            }
            check_endpoints(&what, &p.source, &p.dest)?;
        }

        let servers = Self::derive_servers(&flows, variant.as_deref())?;

        let mut sinks = HashSet::new();
        let all_sinks = servers
            .iter()
            .map(|s| s.sink.clone())
            .chain(flows.iter().map(|f| client_sink(f, variant.as_deref())))
            .chain(probes.iter().map(|p| probe_sink(p, variant.as_deref())));
        for sink in all_sinks {
            let name = sink.file_name();
            if !sinks.insert(name.clone()) {
                return Err(ExperimentError::conflict(format!(
                    "two launches would write the same artifact {name}"
                )));
            }
        }

        let mut q = LaunchQueue::default();
        for (i, f) in flows.iter().enumerate() {
            q.schedule(SimTime::from_secs_f64(f.start_offset_secs), Launch::Flow(i));
        }
        for (i, p) in probes.iter().enumerate() {
            q.schedule(SimTime::from_secs_f64(p.start_offset_secs), Launch::Probe(i));
        }
        let order = q.drain_ordered();
        debug!(servers = servers.len(), launches = order.len(), "时间线已排定");

        Ok(Self {
            flows,
            probes,
            grace_secs,
            variant,
            servers,
            order,
        })
    }

    /// 每个目的主机一个服务端；同一主机上的不同声明是冲突。
    fn derive_servers(
        flows: &[FlowSpec],
        variant: Option<&str>,
    ) -> Result<Vec<ServerLaunch>, ExperimentError> {
        let mut by_host: HashMap<&str, (usize, &ServerSpec)> = HashMap::new();
        let mut servers = Vec::new();
        for (i, f) in flows.iter().enumerate() {
            match by_host.get(f.dest.as_str()) {
                Some((first, spec)) if **spec != f.server => {
                    return Err(ExperimentError::conflict(format!(
                        "flows #{first} and #{i} declare different servers on {}: {:?} vs {:?}",
                        f.dest, spec, f.server
                    )));
                }
                Some(_) => {}
                None => {
                    by_host.insert(&f.dest, (i, &f.server));
                    servers.push(ServerLaunch {
                        host: f.dest.clone(),
                        spec: f.server.clone(),
                        sink: OutputSink {
                            host: f.dest.clone(),
                            role: Role::Server,
                            label: f.server.label.clone(),
                            congestion: Some(f.congestion.clone()),
                            variant: variant.map(str::to_string),
                        },
                    });
                }
            }
        }
        Ok(servers)
    }

    /// 引用的主机都必须存在于拓扑中
    pub fn check_hosts(&self, topo: &Topology) -> Result<(), ExperimentError> {
        let endpoints = self
            .flows
            .iter()
            .flat_map(|f| [&f.source, &f.dest])
            .chain(self.probes.iter().flat_map(|p| [&p.source, &p.dest]));
        for name in endpoints {
            match topo.node_by_name(name) {
                Some(n) if n.is_host() => {}
                _ => {
                    return Err(ExperimentError::config(format!(
                        "timeline references unknown host {name}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn flows(&self) -> &[FlowSpec] {
        &self.flows
    }

    pub fn probes(&self) -> &[ProbeSpec] {
        &self.probes
    }

    pub fn servers(&self) -> &[ServerLaunch] {
        &self.servers
    }

    pub fn grace_secs(&self) -> f64 {
        self.grace_secs
    }

    /// 启动顺序
    pub fn order(&self) -> &[ScheduledLaunch] {
        &self.order
    }

    /// 最晚结束的流/探测之后再加宽限期
    pub fn scenario_duration_secs(&self) -> f64 {
        let last_end = self
            .flows
            .iter()
            .map(FlowSpec::end_secs)
            .chain(self.probes.iter().map(ProbeSpec::end_secs))
            .fold(0.0_f64, f64::max);
        last_end + self.grace_secs
    }

    pub fn scenario_duration(&self) -> SimTime {
        SimTime::from_secs_f64(self.scenario_duration_secs())
    }

    /// 某次启动的输出文件
    pub fn sink_for(&self, launch: Launch) -> Option<OutputSink> {
        let variant = self.variant.as_deref();
        match launch {
            Launch::Flow(i) => self.flows.get(i).map(|f| client_sink(f, variant)),
            Launch::Probe(i) => self.probes.get(i).map(|p| probe_sink(p, variant)),
        }
    }
}

fn client_sink(f: &FlowSpec, variant: Option<&str>) -> OutputSink {
    OutputSink {
        host: f.source.clone(),
        role: Role::Client,
        label: f.output_label.clone(),
        congestion: Some(f.congestion.clone()),
        variant: variant.map(str::to_string),
    }
}

fn probe_sink(p: &ProbeSpec, variant: Option<&str>) -> OutputSink {
    OutputSink {
        host: p.source.clone(),
        role: Role::Probe,
        label: p.output_label.clone(),
        congestion: None,
        variant: variant.map(str::to_string),
    }
}
