//! 输出文件命名
//!
//! 每次启动的 stdout 落到一个由 (主机, 角色, 标签, 拥塞控制, 变体) 唯一确定的文件。

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::flow::CongestionControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Server,
    Client,
    Probe,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
            Role::Probe => "ping",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个输出文件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputSink {
    pub host: String,
    pub role: Role,
    pub label: String,
    pub congestion: Option<CongestionControl>,
    /// 实验变体标记（如队列大小）
    pub variant: Option<String>,
}

impl OutputSink {
    /// `<host>_<role>_<label>_<cc>_<variant>`，空字段跳过
    pub fn file_name(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.host, self.role.as_str()];
        if !self.label.is_empty() {
            parts.push(&self.label);
        }
        if let Some(cc) = &self.congestion {
            parts.push(cc.as_str());
        }
        if let Some(v) = self.variant.as_deref().filter(|v| !v.is_empty()) {
            parts.push(v);
        }
        parts.join("_")
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
