//! 错误类型
//!
//! 实验在接触仿真引擎之前的所有失败（配置、调度）以及引擎拒绝拓扑的致命失败。
//! 连通性问题不是错误，见 [`crate::scenario::ConnectivityWarning`]。

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// 实验失败原因；每个变体对应一个失败阶段。
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// 非法的 `n`、整形参数或引用了不存在的主机。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 仿真引擎拒绝了拓扑；此时不会运行任何流，也不需要拆除网络。
    #[error("topology instantiation failed: {0}")]
    TopologyInstantiation(#[source] EngineError),

    /// FlowSpec 集合不合法（时间参数、服务端声明冲突、输出文件重名等）。
    #[error("scheduling conflict: {0}")]
    SchedulingConflict(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExperimentError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::SchedulingConflict(msg.into())
    }

    /// 失败发生的阶段名，用于面向用户的报错。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::ConfigIo { .. } | Self::ConfigParse { .. } => {
                "configuration"
            }
            Self::TopologyInstantiation(_) => "network start",
            Self::SchedulingConflict(_) => "scheduling",
        }
    }
}
