//! 网络拓扑模型
//!
//! 此模块包含拓扑的核心组件：节点、链路与拓扑图本身。

// 子模块声明
mod id;
mod link;
mod node;
mod topology;

// 重新导出公共接口
pub use id::{LinkId, NodeId};
pub use link::Link;
pub use node::{Node, NodeRole};
pub use topology::Topology;
