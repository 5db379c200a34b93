//! Cable：两个端口之间的双向链路
//!
//! 每条 cable 由两个互相独立的单向投递通道组成。通道循环为：
//! 源端口输出队列为空则进入空闲；被唤醒后取出一帧，标记 active，
//! 保持一个传播时延，再放进对端输入队列并唤醒对端消费者。

use super::id::{CableId, PortId};

/// 通道方向：`AtoB` 从 `ends[0]` 发往 `ends[1]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::AtoB => 0,
            Direction::BtoA => 1,
        }
    }
}

/// 单向投递通道的状态
#[derive(Debug, Clone)]
pub struct Channel {
    pub from: PortId,
    pub to: PortId,
    /// 有帧在途
    pub active: bool,
    /// 已调度唤醒事件但尚未执行，避免重复唤醒
    pub(crate) wake_pending: bool,
    pub in_flight: Option<u64>,
    /// 本通道累计投递帧数
    pub delivered: u64,
}

impl Channel {
    fn new(from: PortId, to: PortId) -> Self {
        Self {
            from,
            to,
            active: false,
            wake_pending: false,
            in_flight: None,
            delivered: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cable {
    id: CableId,
    ends: [PortId; 2],
    channels: [Channel; 2],
    /// 生成树把这条链路两端都阻断时置位，仅供展示；真正起作用的是端口状态。
    blocked: bool,
}

impl Cable {
    pub(crate) fn new(id: CableId, a: PortId, b: PortId) -> Self {
        Self {
            id,
            ends: [a, b],
            channels: [Channel::new(a, b), Channel::new(b, a)],
            blocked: false,
        }
    }

    pub fn id(&self) -> CableId {
        self.id
    }

    pub fn ends(&self) -> [PortId; 2] {
        self.ends
    }

    /// 给定一端，返回另一端。
    pub fn other_end(&self, port: PortId) -> Option<PortId> {
        match self.ends {
            [a, b] if a == port => Some(b),
            [a, b] if b == port => Some(a),
            _ => None,
        }
    }

    /// 从 `port` 发出的通道方向
    pub fn direction_from(&self, port: PortId) -> Option<Direction> {
        if self.ends[0] == port {
            Some(Direction::AtoB)
        } else if self.ends[1] == port {
            Some(Direction::BtoA)
        } else {
            None
        }
    }

    pub fn channel(&self, dir: Direction) -> &Channel {
        &self.channels[dir.index()]
    }

    pub(crate) fn channel_mut(&mut self, dir: Direction) -> &mut Channel {
        &mut self.channels[dir.index()]
    }

    /// 任一方向有帧在途即为 active。
    pub fn is_active(&self) -> bool {
        self.channels.iter().any(|c| c.active)
    }

    pub fn in_flight(&self) -> usize {
        self.channels.iter().filter(|c| c.in_flight.is_some()).count()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }
}
