//! 调度的启动项
//!
//! 定义启动项结构及其优先级比较。

use super::time::SimTime;
use std::cmp::Ordering;

/// 时间线上需要发起的一次启动。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// `ScenarioTimeline::flows()[i]` 的客户端
    Flow(usize),
    /// `ScenarioTimeline::probes()[i]`
    Probe(usize),
}

/// 调度的启动项，包含偏移时间与序列号（声明顺序）。
#[derive(Debug, Clone, Copy)]
pub struct ScheduledLaunch {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) launch: Launch,
}

impl ScheduledLaunch {
    pub fn at(&self) -> SimTime {
        self.at
    }

    pub fn launch(&self) -> Launch {
        self.launch
    }
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，同一时间按声明顺序，因此反向比较。
impl Ord for ScheduledLaunch {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for ScheduledLaunch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledLaunch {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for ScheduledLaunch {}
