//! 时钟
//!
//! 编排器唯一的挂起点是“睡到下一个偏移”和最后的宽限期睡眠，
//! 这里把它抽象成 [`Clock`]，以便测试中使用不真正睡眠的虚拟时钟。

use std::thread;
use std::time::Instant;

use tracing::trace;

use super::time::SimTime;

/// 编排器使用的时钟。
pub trait Clock {
    /// 自时钟创建以来经过的时间。
    fn now(&self) -> SimTime;

    /// 阻塞 `d`。
    fn sleep(&mut self, d: SimTime);

    /// 阻塞直到 `at`；若已经过了 `at` 则立即返回。
    fn sleep_until(&mut self, at: SimTime) {
        let now = self.now();
        if at > now {
            self.sleep(at.saturating_sub(now));
        }
    }
}

/// 墙上时钟：真实睡眠。
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> SimTime {
        SimTime::from(self.origin.elapsed())
    }

    fn sleep(&mut self, d: SimTime) {
        trace!(secs = d.as_secs_f64(), "wall clock sleep");
        thread::sleep(d.as_duration());
    }
}

/// 虚拟时钟：睡眠只推进内部时间，并记录每次睡眠的时长。
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: SimTime,
    sleeps: Vec<SimTime>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有睡眠调用（按发生顺序）。
    pub fn sleeps(&self) -> &[SimTime] {
        &self.sleeps
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> SimTime {
        self.now
    }

    fn sleep(&mut self, d: SimTime) {
        self.sleeps.push(d);
        self.now = self.now.saturating_add(d);
    }
}
