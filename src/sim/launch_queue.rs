//! 启动队列
//!
//! 按偏移升序、同偏移按声明顺序弹出启动项。

use super::scheduled_event::{Launch, ScheduledLaunch};
use super::time::SimTime;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// 启动队列：维护待发起的启动项。
#[derive(Debug, Default)]
pub struct LaunchQueue {
    next_seq: u64,
    q: BinaryHeap<ScheduledLaunch>,
}

impl LaunchQueue {
    /// 在偏移 `at` 处调度一次启动
    pub fn schedule(&mut self, at: SimTime, launch: Launch) {
        let seq = self.next_seq;
        trace!(?at, seq, ?launch, "调度启动项");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledLaunch { at, seq, launch });

        debug!(queue_size = self.q.len(), "启动项已加入队列");
    }

    /// 下一个启动项的偏移
    pub fn next_at(&self) -> Option<SimTime> {
        self.q.peek().map(|s| s.at)
    }

    /// 按启动顺序取出全部启动项。
    pub fn drain_ordered(mut self) -> Vec<ScheduledLaunch> {
        let mut out = Vec::with_capacity(self.q.len());
        while let Some(item) = self.q.pop() {
            out.push(item);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}
