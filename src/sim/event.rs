//! 事件、世界与调度项
//!
//! 投递通道、端口消费者、流量注入都实现 [`Event`]；事件执行时通过
//! [`World`] 拿到织物状态。[`ScheduledEvent`] 是事件在队列里的形态。

use std::any::Any;
use std::cmp::Ordering;

use super::simulator::Simulator;
use super::time::SimTime;

/// 可调度的事件。`self: Box<Self>` 让事件把携带的帧按值交出去。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);

    /// 日志里显示的事件名
    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("event")
    }
}

/// 事件执行时可变访问的状态，由业务层实现。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行完后调用一次。
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}

/// 队列中的事件：`(at, seq)` 越小越先执行。
///
/// 同一时刻按 `seq`（调度顺序）执行，所以同一端口输出队列里的帧按 FIFO
/// 到达对端。
pub struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) ev: Box<dyn Event>,
}

impl ScheduledEvent {
    pub fn at(&self) -> SimTime {
        self.at
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn label(&self) -> &'static str {
        self.ev.label()
    }

    fn key(&self) -> (SimTime, u64) {
        (self.at, self.seq)
    }
}

// BinaryHeap 是大顶堆，这里把键反过来比较
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScheduledEvent {}
