//! 实验时间与调度模块
//!
//! 此模块包含实验时间、时钟抽象以及按偏移排序的启动队列。

// 子模块声明
mod clock;
mod launch_queue;
mod scheduled_event;
mod time;

// 重新导出公共接口
pub use clock::{Clock, VirtualClock, WallClock};
pub use launch_queue::LaunchQueue;
pub use scheduled_event::{Launch, ScheduledLaunch};
pub use time::SimTime;
