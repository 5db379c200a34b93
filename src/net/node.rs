//! 节点类型
//!
//! 所有节点对外暴露同一组端口能力（端口列表、端口数、端口下标、空闲端口、
//! 是否拥有某端口），端口分配有两种策略：
//!
//! - 固定端口（交换机、集线器）：构造时分配 N 个匿名端口，见 [`FixedPorts`]；
//! - 基于网卡（主机、路由器）：端口列表由有序的网卡列表派生，见
//!   [`super::Interfaces`]。

use serde::{Deserialize, Serialize};

use super::fabric::Fabric;
use super::frame::Frame;
use super::id::{NodeId, PortId};
use super::interface_node::InterfaceNode;
use super::nic::Interfaces;
use super::port::Ports;
use super::switch::Switch;
use crate::sim::Simulator;

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Host,
    Router,
    Switch,
    Hub,
}

impl NodeKind {
    /// 是否按网卡分配端口
    pub fn is_interface_based(self) -> bool {
        matches!(self, NodeKind::Host | NodeKind::Router)
    }
}

/// 节点接口
pub trait Node: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 获取节点名称
    fn name(&self) -> &str;

    fn kind(&self) -> NodeKind;

    /// 端口列表（按端口下标顺序）
    fn port_list(&self) -> Vec<PortId>;

    fn port_count(&self) -> usize {
        self.port_list().len()
    }

    fn port_index(&self, port: PortId) -> Option<usize> {
        self.port_list().iter().position(|p| *p == port)
    }

    fn owns_port(&self, port: PortId) -> bool {
        self.port_index(port).is_some()
    }

    /// 第一个还没插 cable 的端口
    fn free_port(&self, ports: &Ports) -> Option<PortId> {
        self.port_list()
            .into_iter()
            .find(|p| ports.get(*p).is_some_and(|port| !port.is_connected()))
    }

    /// 是否有本层的端口消费者。没有消费者的节点（主机、路由器）把帧留在
    /// 输入队列里，交给上层协议栈取走。
    fn consumes_input(&self) -> bool {
        false
    }

    /// 端口消费者：从 `ingress` 的输入队列取出的一帧
    fn on_frame(&mut self, _ingress: PortId, _frame: Frame, _sim: &mut Simulator, _fabric: &mut Fabric) {}

    fn as_switch(&self) -> Option<&Switch> {
        None
    }

    fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        None
    }

    fn as_interface_node(&self) -> Option<&InterfaceNode> {
        None
    }

    fn as_interface_node_mut(&mut self) -> Option<&mut InterfaceNode> {
        None
    }

    /// 基于网卡的节点返回其网卡表
    fn interfaces(&self) -> Option<&Interfaces> {
        self.as_interface_node().map(InterfaceNode::interfaces)
    }
}

/// 固定端口集合：构造时一次性分配。
#[derive(Debug, Clone, Default)]
pub struct FixedPorts {
    ports: Vec<PortId>,
}

impl FixedPorts {
    pub fn allocate(owner: NodeId, count: usize, arena: &mut Ports) -> Self {
        let ports = (0..count).map(|_| arena.alloc(owner)).collect();
        Self { ports }
    }

    pub fn as_slice(&self) -> &[PortId] {
        &self.ports
    }

    pub fn get(&self, index: usize) -> Option<PortId> {
        self.ports.get(index).copied()
    }

    pub fn index_of(&self, port: PortId) -> Option<usize> {
        self.ports.iter().position(|p| *p == port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
