//! 流与探测的声明
//!
//! 场景开始后这些值都不可变。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// TCP 拥塞控制算法（传给 iperf3 `-C`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionControl {
    Cubic,
    Bbr,
    Reno,
    Vegas,
    Htcp,
}

impl CongestionControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cubic => "cubic",
            Self::Bbr => "bbr",
            Self::Reno => "reno",
            Self::Vegas => "vegas",
            Self::Htcp => "htcp",
        }
    }
}

impl fmt::Display for CongestionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CongestionControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cubic" => Ok(Self::Cubic),
            "bbr" => Ok(Self::Bbr),
            "reno" => Ok(Self::Reno),
            "vegas" => Ok(Self::Vegas),
            "htcp" => Ok(Self::Htcp),
            other => Err(format!("unknown congestion control {other:?}")),
        }
    }
}

fn default_interval_secs() -> u64 {
    1
}

/// 目的主机上的服务端声明。同一目的主机的所有声明必须一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// 输出文件标签；为空时文件名只含主机、角色与拥塞控制
    #[serde(default)]
    pub label: String,
    /// 报告间隔（秒）
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ServerSpec {
    fn default() -> Self {
        Self {
            label: String::new(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// 一条客户端 → 服务端的数据流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    /// 客户端主机名（如 `h1`）
    pub source: String,
    /// 服务端主机名
    pub dest: String,
    pub congestion: CongestionControl,
    pub duration_secs: f64,
    #[serde(default)]
    pub start_offset_secs: f64,
    pub output_label: String,
    #[serde(default)]
    pub server: ServerSpec,
}

impl FlowSpec {
    pub fn new(
        source: impl Into<String>,
        dest: impl Into<String>,
        congestion: CongestionControl,
        start_offset_secs: f64,
        duration_secs: f64,
        output_label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            congestion,
            duration_secs,
            start_offset_secs,
            output_label: output_label.into(),
            server: ServerSpec::default(),
        }
    }

    pub fn with_server(mut self, server: ServerSpec) -> Self {
        self.server = server;
        self
    }

    /// 实际传给 iperf3 `-t` 的时长：只接受整数秒，向上取整以免提前结束。
    pub fn run_secs(&self) -> u64 {
        self.duration_secs.max(0.0).ceil() as u64
    }

    /// 按取整后的时长计算结束偏移
    pub fn end_secs(&self) -> f64 {
        self.start_offset_secs + self.run_secs() as f64
    }
}

/// ping 时延探测：`count` 次，间隔 `interval_secs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub source: String,
    pub dest: String,
    pub count: u32,
    #[serde(default = "default_probe_interval")]
    pub interval_secs: f64,
    #[serde(default)]
    pub start_offset_secs: f64,
    pub output_label: String,
}

fn default_probe_interval() -> f64 {
    1.0
}

impl ProbeSpec {
    pub fn duration_secs(&self) -> f64 {
        self.count as f64 * self.interval_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.start_offset_secs + self.duration_secs()
    }
}
