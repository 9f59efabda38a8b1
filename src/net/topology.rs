//! 网络拓扑
//!
//! 有序的节点与无向链路集合。拓扑在仿真网络存在之前构建，
//! 之后只读地交给编排器和引擎。

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::trace;

use super::id::{LinkId, NodeId};
use super::link::{Link, edge_key};
use super::node::Node;
use crate::error::ExperimentError;
use crate::shaping::ShapingDescriptor;
use crate::sim::SimTime;

/// 网络拓扑
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Topology {
    nodes: Vec<Node>,
    links: Vec<Link>,
    #[serde(skip)]
    edges: HashMap<(NodeId, NodeId), LinkId>,
    /// 每个节点的 (邻居, 链路)，按链路添加顺序
    #[serde(skip)]
    adj: Vec<Vec<(NodeId, LinkId)>>,
}

impl Topology {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>, ip: Ipv4Addr) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::host(id, name, ip));
        self.adj.push(Vec::new());
        id
    }

    /// 添加交换机节点
    pub fn add_switch(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::switch(id, name));
        self.adj.push(Vec::new());
        id
    }

    /// 连接两个节点（无向链路）；自环或重复链路视为配置错误。
    pub fn connect(
        &mut self,
        a: NodeId,
        b: NodeId,
        shaping: Option<ShapingDescriptor>,
    ) -> Result<LinkId, ExperimentError> {
        if a == b {
            return Err(ExperimentError::config(format!("self-loop link on {a:?}")));
        }
        if a.0 >= self.nodes.len() || b.0 >= self.nodes.len() {
            return Err(ExperimentError::config(format!(
                "link {a:?}-{b:?} references an unknown node"
            )));
        }
        let key = edge_key(a, b);
        if self.edges.contains_key(&key) {
            return Err(ExperimentError::config(format!(
                "duplicate link between {} and {}",
                self.nodes[a.0].name, self.nodes[b.0].name
            )));
        }
        let id = LinkId(self.links.len());
        trace!(?id, ?a, ?b, shaped = shaping.is_some(), "添加链路");
        self.links.push(Link::new(id, a, b, shaping));
        self.edges.insert(key, id);
        self.adj[a.0].push((b, id));
        self.adj[b.0].push((a, id));
        Ok(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.edges.get(&edge_key(a, b)).map(|id| &self.links[id.0])
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_host())
    }

    pub fn switches(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_switch())
    }

    /// 携带整形描述符的链路
    pub fn bottlenecks(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.shaping_enabled())
    }

    /// 与 `id` 相连的链路
    pub fn links_of(&self, id: NodeId) -> impl Iterator<Item = &Link> {
        self.adjacent(id).iter().map(|(_, l)| &self.links[l.0])
    }

    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.adjacent(id).iter().map(|(n, _)| *n).collect()
    }

    fn adjacent(&self, id: NodeId) -> &[(NodeId, LinkId)] {
        self.adj.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 主机所挂接的交换机（主机恰有一条链路）
    pub fn attached_switch(&self, host: NodeId) -> Option<NodeId> {
        let mut it = self
            .links_of(host)
            .filter_map(|l| l.other(host))
            .filter(|n| self.nodes[n.0].is_switch());
        let sw = it.next()?;
        if it.next().is_some() {
            return None;
        }
        Some(sw)
    }

    /// 每台主机的挂接关系 `(host, switch)`，按主机顺序。
    pub fn connections(&self) -> Vec<(String, String)> {
        self.hosts()
            .filter_map(|h| {
                let sw = self.attached_switch(h.id)?;
                Some((h.name.clone(), self.nodes[sw.0].name.clone()))
            })
            .collect()
    }

    /// 从 `from` 出发的 BFS 前驱表；`seen[v]` 表示 v 可达。
    fn bfs(&self, from: NodeId, to: Option<NodeId>) -> (Vec<bool>, Vec<Option<NodeId>>) {
        let n = self.nodes.len();
        let mut prev: Vec<Option<NodeId>> = vec![None; n];
        let mut seen = vec![false; n];
        if from.0 >= n {
            return (seen, prev);
        }
        let mut q = VecDeque::new();
        seen[from.0] = true;
        q.push_back(from);

        while let Some(v) = q.pop_front() {
            if Some(v) == to {
                break;
            }
            for &(nb, _) in self.adjacent(v) {
                if !seen[nb.0] {
                    seen[nb.0] = true;
                    prev[nb.0] = Some(v);
                    q.push_back(nb);
                }
            }
        }
        (seen, prev)
    }

    /// 从 `from` 可达的所有节点（含自身），按节点下标索引。
    pub fn reachable_from(&self, from: NodeId) -> Vec<bool> {
        self.bfs(from, None).0
    }

    /// 最短跳数路径（BFS），包含两端。
    pub fn path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if to.0 >= self.nodes.len() {
            return None;
        }
        let (seen, prev) = self.bfs(from, Some(to));
        if !seen[to.0] {
            return None;
        }
        let mut path = vec![to];
        let mut cur = to;
        while let Some(p) = prev[cur.0] {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path)
    }

    /// 基础往返时延：路径上各链路单向时延之和的两倍（不含排队）。
    pub fn base_rtt(&self, from: NodeId, to: NodeId) -> Option<SimTime> {
        let path = self.path(from, to)?;
        let one_way = path
            .windows(2)
            .filter_map(|w| self.link_between(w[0], w[1]))
            .filter_map(|l| l.shaping.as_ref())
            .fold(SimTime::ZERO, |acc, s| acc.saturating_add(s.delay.as_sim_time()));
        Some(SimTime(one_way.0.saturating_mul(2)))
    }
}
