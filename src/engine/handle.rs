//! 流句柄
//!
//! 流是由引擎管理的后台任务。如果引擎能报告完成状态就用它，
//! 否则退回到“按时长推断”的粗粒度约定。

use std::fmt;

use crate::scenario::OutputSink;
use crate::sim::{Clock, SimTime};

/// 引擎侧任务的完成信号
pub trait FlowTask: fmt::Debug {
    /// `None` 表示引擎无法判断
    fn is_finished(&self) -> Option<bool>;
}

/// 一次启动（服务端、客户端或探测）的句柄
#[derive(Debug)]
pub struct FlowHandle {
    pub host: String,
    pub sink: OutputSink,
    pub started_at: SimTime,
    /// 预期结束时刻；服务端一直运行到拆除，为 None
    pub expected_end: Option<SimTime>,
    task: Option<Box<dyn FlowTask>>,
}

impl FlowHandle {
    pub fn new(
        host: impl Into<String>,
        sink: OutputSink,
        started_at: SimTime,
        expected_end: Option<SimTime>,
        task: Option<Box<dyn FlowTask>>,
    ) -> Self {
        Self {
            host: host.into(),
            sink,
            started_at,
            expected_end,
            task,
        }
    }

    /// 在 `now` 时刻是否已完成
    pub fn is_complete(&self, now: SimTime) -> bool {
        if let Some(done) = self.task.as_ref().and_then(|t| t.is_finished()) {
            return done;
        }
        match self.expected_end {
            Some(end) => now >= end,
            None => false,
        }
    }

    /// 最多等待 `timeout`，返回等待结束时是否完成。
    ///
    /// 没有完成信号时只睡到预期结束时刻（或超时），不轮询。
    pub fn join(&self, timeout: SimTime, clock: &mut dyn Clock) -> bool {
        let now = clock.now();
        if self.is_complete(now) {
            return true;
        }
        let deadline = now.saturating_add(timeout);
        let target = match self.expected_end {
            Some(end) => end.min(deadline),
            None => deadline,
        };
        clock.sleep_until(target);
        self.is_complete(clock.now())
    }
}
