//! 链路类型
//!
//! 无向链路；只有瓶颈链路携带整形描述符，其余使用引擎默认参数。

use serde::Serialize;

use super::id::{LinkId, NodeId};
use crate::shaping::ShapingDescriptor;

/// 网络链路
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub id: LinkId,
    pub a: NodeId,
    pub b: NodeId,
    /// None 表示不整形（引擎默认）
    pub shaping: Option<ShapingDescriptor>,
}

impl Link {
    /// 创建新链路
    pub fn new(id: LinkId, a: NodeId, b: NodeId, shaping: Option<ShapingDescriptor>) -> Self {
        Self { id, a, b, shaping }
    }

    pub fn shaping_enabled(&self) -> bool {
        self.shaping.is_some()
    }

    /// 给定一端，返回另一端
    pub fn other(&self, n: NodeId) -> Option<NodeId> {
        if self.a == n {
            Some(self.b)
        } else if self.b == n {
            Some(self.a)
        } else {
            None
        }
    }

    /// 无向边的规范化键
    pub(crate) fn key(&self) -> (NodeId, NodeId) {
        edge_key(self.a, self.b)
    }
}

pub(crate) fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}
