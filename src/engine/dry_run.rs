//! Dry-run 引擎
//!
//! 不创建任何网络：校验拓扑、用图搜索回答连通性探测，并记录所有启动命令。

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::{ConnectivityReport, EmulationEngine, EngineError, FlowTask, HostCommand, PingResult};
use crate::net::{Node, Topology};

#[derive(Debug, Default)]
pub struct DryRunEngine {
    topo: Option<Topology>,
    running: bool,
    /// 被视为断开的主机对（双向）
    down_pairs: HashSet<(String, String)>,
    launches: Vec<(String, HostCommand)>,
    starts: usize,
    stops: usize,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让 `a` 与 `b` 之间的探测失败
    pub fn with_down_pair(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        self.down_pairs.insert((b.clone(), a.clone()));
        self.down_pairs.insert((a, b));
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn launches(&self) -> &[(String, HostCommand)] {
        &self.launches
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn stops(&self) -> usize {
        self.stops
    }

    fn validate(topo: &Topology) -> Result<(), EngineError> {
        let n = topo.nodes().len();
        let mut seen = HashSet::new();
        for link in topo.links() {
            if link.a.0 >= n || link.b.0 >= n {
                return Err(EngineError::Rejected(format!(
                    "link {:?} references an unknown node",
                    link.id
                )));
            }
            if !seen.insert(link.key()) {
                return Err(EngineError::Rejected(format!(
                    "duplicate link {:?}-{:?}",
                    link.a, link.b
                )));
            }
        }
        for host in topo.hosts() {
            let degree = topo.links_of(host.id).count();
            if degree != 1 {
                return Err(EngineError::Rejected(format!(
                    "host {} has {degree} links, expected exactly one",
                    host.name
                )));
            }
        }
        let mut names = HashSet::new();
        for node in topo.nodes() {
            if !names.insert(node.name.as_str()) {
                return Err(EngineError::Rejected(format!(
                    "duplicate node name {}",
                    node.name
                )));
            }
        }
        Ok(())
    }
}

impl EmulationEngine for DryRunEngine {
    #[tracing::instrument(
        skip(self, topo),
        fields(nodes = topo.nodes().len(), links = topo.links().len())
    )]
    fn start(&mut self, topo: &Topology) -> Result<(), EngineError> {
        Self::validate(topo)?;
        for link in topo.bottlenecks() {
            if let Some(s) = &link.shaping {
                for cmd in s.tc_commands(&format!("link{}", link.id.0)) {
                    debug!(%cmd, "整形命令");
                }
            }
        }
        self.topo = Some(topo.clone());
        self.running = true;
        self.starts += 1;
        info!("▶️  dry-run 网络已启动");
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
        info!("⏹️  dry-run 网络已停止");
    }

    fn node(&self, name: &str) -> Option<&Node> {
        if !self.running {
            return None;
        }
        self.topo.as_ref()?.node_by_name(name)
    }

    fn ping_all(&mut self) -> ConnectivityReport {
        let mut report = ConnectivityReport::default();
        let Some(topo) = self.topo.as_ref().filter(|_| self.running) else {
            warn!("网络未运行，跳过探测");
            return report;
        };
        let hosts: Vec<&Node> = topo.hosts().collect();
        report.results.reserve(hosts.len() * hosts.len().saturating_sub(1));
        for src in &hosts {
            let seen = topo.reachable_from(src.id);
            for dst in &hosts {
                if src.id == dst.id {
                    continue;
                }
                let down = self
                    .down_pairs
                    .contains(&(src.name.clone(), dst.name.clone()));
                let reachable = !down && seen[dst.id.0];
                report.results.push(PingResult {
                    src: src.name.clone(),
                    dst: dst.name.clone(),
                    reachable,
                });
            }
        }
        report
    }

    fn launch(
        &mut self,
        host: &str,
        cmd: &HostCommand,
    ) -> Result<Option<Box<dyn FlowTask>>, EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }
        if self.node(host).is_none() {
            return Err(EngineError::UnknownHost(host.to_string()));
        }
        debug!(host, line = %cmd.shell_line(), "记录启动命令");
        self.launches.push((host.to_string(), cmd.clone()));
        Ok(None)
    }
}
