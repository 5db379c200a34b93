//! 仿真核心模块
//!
//! 虚拟时钟 + 事件队列。链路投递、端口消费者都以事件的形式挂在同一个
//! `Simulator` 上，时间是逻辑时间，不依赖墙钟。

mod event;
mod simulator;
mod time;

pub use event::{Event, ScheduledEvent, World};
pub use simulator::Simulator;
pub use time::SimTime;
