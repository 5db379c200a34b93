//! 端口与端口 arena
//!
//! 端口属于唯一一个节点，最多连一条 cable，持有输入/输出两个 FIFO 队列。
//! 端口状态 `PortStatus` 只对交换机端口有意义，由生成树计算设置。

use serde::{Deserialize, Serialize};

use super::frame::Frame;
use super::id::{CableId, NodeId, PortId};
use crate::queue::FifoQueue;

/// 交换机端口状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    /// 未被生成树处理（或连向非交换机节点）
    #[default]
    Empty,
    /// 生成树中的有效链路
    Used,
    /// 被生成树阻断：入帧一律丢弃，也不参与泛洪
    Blocked,
}

#[derive(Debug)]
pub struct Port {
    id: PortId,
    owner: NodeId,
    cable: Option<CableId>,
    status: PortStatus,
    input: FifoQueue,
    output: FifoQueue,
}

impl Port {
    pub fn new(id: PortId, owner: NodeId) -> Self {
        Self {
            id,
            owner,
            cable: None,
            status: PortStatus::Empty,
            input: FifoQueue::new(),
            output: FifoQueue::new(),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn cable(&self) -> Option<CableId> {
        self.cable
    }

    pub fn is_connected(&self) -> bool {
        self.cable.is_some()
    }

    /// 绑定 cable。重复绑定同一条 cable 视为成功；已被其他 cable 占用时返回 false。
    pub fn set_cable(&mut self, cable: CableId) -> bool {
        match self.cable {
            None => {
                self.cable = Some(cable);
                true
            }
            Some(existing) => existing == cable,
        }
    }

    /// 解除 cable 绑定（幂等）。
    pub fn remove_cable(&mut self) -> Option<CableId> {
        self.cable.take()
    }

    pub fn status(&self) -> PortStatus {
        self.status
    }

    pub fn set_status(&mut self, status: PortStatus) {
        self.status = status;
    }

    pub fn is_blocked(&self) -> bool {
        self.status == PortStatus::Blocked
    }

    pub fn enqueue_output(&mut self, frame: Frame) {
        self.output.push(frame);
    }

    pub fn enqueue_input(&mut self, frame: Frame) {
        self.input.push(frame);
    }

    pub fn dequeue_output(&mut self) -> Option<Frame> {
        self.output.pop()
    }

    pub fn dequeue_input(&mut self) -> Option<Frame> {
        self.input.pop()
    }

    pub fn input(&self) -> &FifoQueue {
        &self.input
    }

    pub fn output(&self) -> &FifoQueue {
        &self.output
    }

    pub fn clear_queues(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}

/// 端口 arena：按 `PortId` 下标存放，删除后留空位。
#[derive(Debug, Default)]
pub struct Ports {
    slots: Vec<Option<Port>>,
}

impl Ports {
    pub fn alloc(&mut self, owner: NodeId) -> PortId {
        let id = PortId(self.slots.len());
        self.slots.push(Some(Port::new(id, owner)));
        id
    }

    pub fn get(&self, id: PortId) -> Option<&Port> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: PortId) -> Option<Port> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn contains(&self, id: PortId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.slots.iter_mut().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
