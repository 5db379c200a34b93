//! 交换机：学习网桥 + 泛洪
//!
//! 每个收到的帧按以下步骤处理：
//! 1. 入端口被生成树阻断则直接丢弃，SAT 不变；
//! 2. 把源 MAC 绑定到入端口（后写覆盖，拓扑变化后可自愈）；源 MAC 是
//!    广播地址时跳过学习；
//! 3. 目的 MAC 在 SAT 中则单播到对应端口（恰为入端口时过滤掉），否则
//!    泛洪到除入端口外所有已连接且未被阻断的端口。

use std::collections::HashMap;

use tracing::{debug, trace};

use super::fabric::Fabric;
use super::frame::Frame;
use super::id::{NodeId, PortId};
use super::mac::MacAddr;
use super::node::{FixedPorts, Node, NodeKind};
use super::port::Ports;
use crate::sim::Simulator;
use crate::viz::VizDropReason;

/// 源地址表（source address table）：MAC → 端口
#[derive(Debug, Clone, Default)]
pub struct Sat {
    table: HashMap<MacAddr, PortId>,
}

impl Sat {
    /// 绑定 `mac` 到 `port`；返回绑定是否发生了变化。
    pub fn learn(&mut self, mac: MacAddr, port: PortId) -> bool {
        self.table.insert(mac, port) != Some(port)
    }

    pub fn lookup(&self, mac: MacAddr) -> Option<PortId> {
        self.table.get(&mac).copied()
    }

    pub fn forget_port(&mut self, port: PortId) {
        self.table.retain(|_, p| *p != port);
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MacAddr, &PortId)> {
        self.table.iter()
    }
}

/// 交换机节点
#[derive(Debug)]
pub struct Switch {
    id: NodeId,
    name: String,
    ports: FixedPorts,
    sat: Sat,
    /// 仅在生成树计算期间使用
    connected_to_root: bool,
}

impl Switch {
    /// 创建新交换机，并在 arena 中分配 `port_count` 个端口
    pub fn new(id: NodeId, name: impl Into<String>, port_count: usize, arena: &mut Ports) -> Self {
        Self {
            id,
            name: name.into(),
            ports: FixedPorts::allocate(id, port_count, arena),
            sat: Sat::default(),
            connected_to_root: false,
        }
    }

    pub fn port(&self, index: usize) -> Option<PortId> {
        self.ports.get(index)
    }

    pub fn sat(&self) -> &Sat {
        &self.sat
    }

    pub fn clear_sat(&mut self) {
        self.sat.clear();
    }

    pub(crate) fn forget_port(&mut self, port: PortId) {
        self.sat.forget_port(port);
    }

    /// SAT 内容：(MAC, 端口下标)，按 MAC 排序
    pub fn sat_entries(&self) -> Vec<(MacAddr, usize)> {
        let mut out: Vec<(MacAddr, usize)> = self
            .sat
            .iter()
            .filter_map(|(mac, port)| self.ports.index_of(*port).map(|idx| (*mac, idx)))
            .collect();
        out.sort();
        out
    }

    pub fn connected_to_root(&self) -> bool {
        self.connected_to_root
    }

    pub(crate) fn set_connected_to_root(&mut self, v: bool) {
        self.connected_to_root = v;
    }

    fn flood(&self, ingress: PortId, frame: &Frame, sim: &mut Simulator, fabric: &mut Fabric) {
        let targets: Vec<PortId> = self
            .ports
            .as_slice()
            .iter()
            .copied()
            .filter(|p| *p != ingress)
            .filter(|p| {
                fabric
                    .port(*p)
                    .is_some_and(|port| port.is_connected() && !port.is_blocked())
            })
            .collect();

        debug!(targets = targets.len(), "🌊 目的 MAC 未知，泛洪");
        fabric.note_flooded(self.id, ingress, &targets, frame);
        for p in targets {
            fabric.push_output(p, frame.clone(), sim);
        }
    }
}

impl Node for Switch {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Switch
    }

    fn port_list(&self) -> Vec<PortId> {
        self.ports.as_slice().to_vec()
    }

    fn port_count(&self) -> usize {
        self.ports.len()
    }

    fn port_index(&self, port: PortId) -> Option<usize> {
        self.ports.index_of(port)
    }

    fn consumes_input(&self) -> bool {
        true
    }

    #[tracing::instrument(skip(self, frame, sim, fabric), fields(node_name = %self.name, frame_id = frame.id(), ingress = ?ingress))]
    fn on_frame(&mut self, ingress: PortId, frame: Frame, sim: &mut Simulator, fabric: &mut Fabric) {
        debug!("🔀 Switch 处理帧");
        trace!(src = %frame.src(), dst = %frame.dst(), "帧信息");

        if fabric.port(ingress).is_none_or(|p| p.is_blocked()) {
            debug!("入端口已被阻断，丢弃");
            fabric.drop_frame(self.id, ingress, &frame, VizDropReason::BlockedPort);
            return;
        }

        if !frame.src().is_broadcast() && self.sat.learn(frame.src(), ingress) {
            trace!(mac = %frame.src(), port = ?ingress, "SAT 学习");
            fabric.note_learned(self.id, frame.src(), ingress);
        }

        match self.sat.lookup(frame.dst()) {
            Some(out) if out == ingress => {
                debug!("目的端口与入端口相同，过滤");
                fabric.drop_frame(self.id, ingress, &frame, VizDropReason::Filtered);
            }
            Some(out) => {
                debug!(egress = ?out, "单播转发");
                fabric.note_forwarded(self.id, ingress, out, &frame);
                fabric.push_output(out, frame, sim);
            }
            None => self.flood(ingress, &frame, sim, fabric),
        }
    }

    fn as_switch(&self) -> Option<&Switch> {
        Some(self)
    }

    fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        Some(self)
    }
}
