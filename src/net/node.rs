//! 节点类型
//!
//! 定义网络节点：主机（叶子）与交换机。

use std::net::Ipv4Addr;

use serde::Serialize;

use super::id::NodeId;

/// 节点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Host,
    Switch,
}

/// 网络节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub role: NodeRole,
    /// 仅主机有地址
    pub ip: Option<Ipv4Addr>,
}

impl Node {
    /// 创建新主机
    pub fn host(id: NodeId, name: impl Into<String>, ip: Ipv4Addr) -> Self {
        Self {
            id,
            name: name.into(),
            role: NodeRole::Host,
            ip: Some(ip),
        }
    }

    /// 创建新交换机
    pub fn switch(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: NodeRole::Switch,
            ip: None,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == NodeRole::Host
    }

    pub fn is_switch(&self) -> bool {
        self.role == NodeRole::Switch
    }
}
