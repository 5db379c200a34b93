//! 网络织物：节点、端口、cable 的中央登记处
//!
//! 采用 arena + id 的所有权模型：`Fabric` 持有全部节点、端口和 cable，
//! 端口的“所属节点”“所连 cable”都是按 id 查表，而不是互相持有引用。
//! 数据面（入队、通道投递、端口消费者）见 `deliver.rs`。

use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use super::cable::{Cable, Direction};
use super::frame::Frame;
use super::hub::Hub;
use super::id::{CableId, NodeId, PortId};
use super::interface_node::InterfaceNode;
use super::mac::MacAddr;
use super::nic::NetworkInterface;
use super::node::Node;
use super::observer::FabricObserver;
use super::port::{Port, PortStatus, Ports};
use super::routing::RouteEntry;
use super::stats::Stats;
use super::switch::Switch;
use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::sim::{SimTime, Simulator};
use crate::stp::{self, StpReport};
use crate::viz::VizEventKind;

#[derive(Default)]
pub struct Fabric {
    pub(super) cfg: SimConfig,
    /// 最近一次数据面操作时的仿真时间，用于给事件打时间戳
    pub(super) now: SimTime,
    /// 每次 `start_run` / `stop_run` 加一，旧一轮调度的事件执行时被忽略
    pub(super) epoch: u64,
    nodes: Vec<Option<Box<dyn Node>>>,
    pub(super) ports: Ports,
    pub(super) cables: Vec<Option<Cable>>,
    next_frame_id: u64,
    next_mac: u64,
    /// 在事件之外变为可运行的通道，等待下一次 `flush_wakes`
    pub(super) pending_wakes: Vec<(CableId, Direction)>,
    pub(super) observers: Vec<Box<dyn FabricObserver>>,
    pub stats: Stats,
}

impl Fabric {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn config(&self) -> SimConfig {
        self.cfg
    }

    /// 替换配置；只影响之后才开始传播的帧。
    pub fn set_config(&mut self, cfg: SimConfig) {
        info!(delay_factor = cfg.delay_factor(), rtt_factor = cfg.rtt_factor(), "更新仿真配置");
        self.cfg = cfg;
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 订阅织物事件
    pub fn subscribe(&mut self, observer: Box<dyn FabricObserver>) {
        self.observers.push(observer);
    }

    // ---- 节点 ----

    fn push_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = node.id();
        debug_assert_eq!(id.0, self.nodes.len());
        info!(node_id = ?id, name = node.name(), kind = ?node.kind(), "添加节点");
        self.nodes.push(Some(node));
        id
    }

    /// 添加交换机节点（固定端口）
    pub fn add_switch(&mut self, name: impl Into<String>, port_count: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let sw = Switch::new(id, name, port_count, &mut self.ports);
        self.push_node(Box::new(sw))
    }

    /// 添加集线器节点（固定端口）
    pub fn add_hub(&mut self, name: impl Into<String>, port_count: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let hub = Hub::new(id, name, port_count, &mut self.ports);
        self.push_node(Box::new(hub))
    }

    /// 添加主机节点（尚无网卡）
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(InterfaceNode::host(id, name)))
    }

    /// 添加路由器节点（尚无网卡）
    pub fn add_router(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(InterfaceNode::router(id, name)))
    }

    /// 删除节点：先拆掉它所有端口上的 cable，再释放端口。
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let ports = self.node(id).ok_or(Error::UnknownNode(id))?.port_list();
        for port in ports {
            if let Some(cable) = self.ports.get(port).and_then(Port::cable) {
                self.disconnect(cable);
            }
            self.ports.remove(port);
        }
        self.nodes[id.0] = None;
        info!(node_id = ?id, "删除节点");
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0).and_then(|n| n.as_deref())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_deref_mut())
    }

    /// 暂时取出节点，避免 `&mut self` 与 `&mut node` 的重叠借用
    pub(super) fn take_node(&mut self, id: NodeId) -> Option<Box<dyn Node>> {
        self.nodes.get_mut(id.0).and_then(Option::take)
    }

    pub(super) fn put_node(&mut self, node: Box<dyn Node>) {
        let idx = node.id().0;
        self.nodes[idx] = Some(node);
    }

    /// 按登记顺序列出现存节点
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().flatten().map(|n| n.id()).collect()
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().flatten().find(|n| n.name() == name).map(|n| n.id())
    }

    pub fn node_ports(&self, id: NodeId) -> Vec<PortId> {
        self.node(id).map(|n| n.port_list()).unwrap_or_default()
    }

    /// 节点上所有未连接的端口
    pub fn free_ports(&self, id: NodeId) -> Vec<PortId> {
        self.node_ports(id)
            .into_iter()
            .filter(|p| self.ports.get(*p).is_some_and(|port| !port.is_connected()))
            .collect()
    }

    pub fn free_port(&self, id: NodeId) -> Option<PortId> {
        self.node(id).and_then(|n| n.free_port(&self.ports))
    }

    pub fn switch(&self, id: NodeId) -> Option<&Switch> {
        self.node(id).and_then(|n| n.as_switch())
    }

    pub(crate) fn switch_mut(&mut self, id: NodeId) -> Option<&mut Switch> {
        self.node_mut(id).and_then(|n| n.as_switch_mut())
    }

    /// 所有交换机，按登记顺序（生成树的根选择依赖这个顺序）
    pub fn switch_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| n.as_switch().is_some())
            .map(|n| n.id())
            .collect()
    }

    pub fn interface_node(&self, id: NodeId) -> Result<&InterfaceNode> {
        let node = self.node(id).ok_or(Error::UnknownNode(id))?;
        node.as_interface_node().ok_or(Error::NotInterfaceNode(id))
    }

    pub fn interface_node_mut(&mut self, id: NodeId) -> Result<&mut InterfaceNode> {
        let node = self.node_mut(id).ok_or(Error::UnknownNode(id))?;
        node.as_interface_node_mut().ok_or(Error::NotInterfaceNode(id))
    }

    // ---- 网卡与路由 ----

    /// 为主机/路由器添加网卡，自动分配唯一 MAC；返回网卡独占的端口
    pub fn add_interface(&mut self, node: NodeId, ip: Ipv4Addr, mask: Ipv4Addr) -> Result<PortId> {
        let mac = self.alloc_mac();
        self.add_interface_with_mac(node, ip, mask, mac)
    }

    pub fn add_interface_with_mac(
        &mut self,
        node: NodeId,
        ip: Ipv4Addr,
        mask: Ipv4Addr,
        mac: MacAddr,
    ) -> Result<PortId> {
        // 先校验节点类型，失败时不分配端口
        self.interface_node(node)?;
        let port = self.ports.alloc(node);
        let now = self.now;
        let n = self.interface_node_mut(node)?;
        n.interfaces_mut()
            .push(NetworkInterface::new(port, ip, mask, mac));
        n.reseed_rip(now);
        debug!(node_id = ?node, %ip, %mask, %mac, port = ?port, "添加网卡");
        Ok(port)
    }

    fn alloc_mac(&mut self) -> MacAddr {
        self.next_mac = self.next_mac.wrapping_add(1);
        MacAddr::local(self.next_mac)
    }

    /// 删除网卡：拆掉其 cable 并释放端口
    pub fn remove_interface(&mut self, node: NodeId, port: PortId) -> Result<NetworkInterface> {
        let now = self.now;
        let n = self.interface_node_mut(node)?;
        let nic = n
            .interfaces_mut()
            .remove_by_port(port)
            .ok_or(Error::UnknownPort(port))?;
        n.reseed_rip(now);
        if let Some(cable) = self.ports.get(port).and_then(Port::cable) {
            self.disconnect(cable);
        }
        self.ports.remove(port);
        Ok(nic)
    }

    /// 修改网卡地址
    pub fn set_interface_address(
        &mut self,
        node: NodeId,
        port: PortId,
        ip: Ipv4Addr,
        mask: Ipv4Addr,
    ) -> Result<()> {
        let now = self.now;
        let n = self.interface_node_mut(node)?;
        let nic = n
            .interfaces_mut()
            .by_port_mut(port)
            .ok_or(Error::UnknownPort(port))?;
        nic.ip = ip;
        nic.mask = mask;
        n.reseed_rip(now);
        Ok(())
    }

    pub fn set_gateway(&mut self, node: NodeId, gateway: Option<Ipv4Addr>) -> Result<()> {
        self.interface_node_mut(node)?.set_gateway(gateway);
        Ok(())
    }

    /// 开关动态路由。开启时用当前网卡写入直连路由。
    pub fn set_dynamic_routing(&mut self, node: NodeId, enabled: bool) -> Result<()> {
        let now = self.now;
        let n = self.interface_node_mut(node)?;
        if enabled {
            n.routing_mut().enable_dynamic();
            n.reseed_rip(now);
        } else {
            n.routing_mut().disable_dynamic();
        }
        Ok(())
    }

    pub fn add_route(&mut self, node: NodeId, entry: RouteEntry) -> Result<()> {
        self.interface_node_mut(node)?.routing_mut().add_manual(entry);
        Ok(())
    }

    /// 上层 IP 查询下一跳
    pub fn best_route(&self, node: NodeId, target: Ipv4Addr) -> Result<RouteEntry> {
        self.interface_node(node)?.best_route(target)
    }

    pub fn find_interface_by_ip(&self, ip: Ipv4Addr) -> Option<(NodeId, &NetworkInterface)> {
        self.nodes
            .iter()
            .flatten()
            .find_map(|n| n.interfaces()?.by_ip(ip).map(|nic| (n.id(), nic)))
    }

    pub fn find_interface_by_mac(&self, mac: MacAddr) -> Option<(NodeId, &NetworkInterface)> {
        self.nodes
            .iter()
            .flatten()
            .find_map(|n| n.interfaces()?.by_mac(mac).map(|nic| (n.id(), nic)))
    }

    // ---- 端口 ----

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    pub fn port_status(&self, id: PortId) -> Option<PortStatus> {
        self.ports.get(id).map(Port::status)
    }

    pub(crate) fn set_port_status(&mut self, id: PortId, status: PortStatus) {
        if let Some(p) = self.ports.get_mut(id) {
            p.set_status(status);
        }
    }

    pub fn owner_of(&self, port: PortId) -> Option<NodeId> {
        self.ports.get(port).map(Port::owner)
    }

    /// cable 另一端的端口
    pub fn remote_port(&self, port: PortId) -> Option<PortId> {
        let cable = self.ports.get(port)?.cable()?;
        self.cable(cable)?.other_end(port)
    }

    // ---- cable ----

    pub fn cable(&self, id: CableId) -> Option<&Cable> {
        self.cables.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn cable_mut(&mut self, id: CableId) -> Option<&mut Cable> {
        self.cables.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn cable_ids(&self) -> Vec<CableId> {
        self.cables.iter().flatten().map(Cable::id).collect()
    }

    /// 连接 `a`、`b` 两个节点的第一条 cable
    pub fn cable_between(&self, a: NodeId, b: NodeId) -> Option<CableId> {
        self.cables.iter().flatten().find_map(|c| {
            let [pa, pb] = c.ends();
            let (oa, ob) = (self.owner_of(pa)?, self.owner_of(pb)?);
            ((oa == a && ob == b) || (oa == b && ob == a)).then_some(c.id())
        })
    }

    /// 用 cable 连接两个端口。
    ///
    /// 任一端口不存在、两端相同或已被占用时返回 `ConnectionFailed`，
    /// 且不会留下任何半绑定。
    #[tracing::instrument(skip(self))]
    pub fn connect(&mut self, a: PortId, b: PortId) -> Result<CableId> {
        if a == b {
            return Err(Error::connection(format!("port {a:?} cannot be cabled to itself")));
        }
        for p in [a, b] {
            match self.ports.get(p) {
                None => return Err(Error::connection(format!("port {p:?} does not exist"))),
                Some(port) if port.is_connected() => {
                    return Err(Error::connection(format!("port {p:?} is already occupied")));
                }
                Some(_) => {}
            }
        }

        let id = CableId(self.cables.len());
        for p in [a, b] {
            if let Some(port) = self.ports.get_mut(p) {
                port.set_cable(id);
            }
        }
        self.cables.push(Some(Cable::new(id, a, b)));
        info!(cable = ?id, "🔌 cable 已连接");
        self.emit(VizEventKind::CableConnected {
            cable: id.0,
            port_a: a.0,
            port_b: b.0,
        });

        // 两个方向的投递通道随连接启动；已有积压帧的方向排队等待唤醒
        for (port, dir) in [(a, Direction::AtoB), (b, Direction::BtoA)] {
            if self.ports.get(port).is_some_and(|p| !p.output().is_empty()) {
                self.pending_wakes.push((id, dir));
            }
        }
        Ok(id)
    }

    /// 用各自第一个空闲端口连接两个节点
    pub fn connect_nodes(&mut self, a: NodeId, b: NodeId) -> Result<CableId> {
        let free_a = self.free_ports(a);
        let pa = *free_a
            .first()
            .ok_or_else(|| Error::connection(format!("node {a:?} has no free port")))?;
        let pb = self
            .free_ports(b)
            .into_iter()
            .find(|p| *p != pa)
            .ok_or_else(|| Error::connection(format!("node {b:?} has no free port")))?;
        self.connect(pa, pb)
    }

    /// 按端口下标连接两个节点
    pub fn connect_port_indices(
        &mut self,
        a: NodeId,
        a_index: usize,
        b: NodeId,
        b_index: usize,
    ) -> Result<CableId> {
        let pa = self
            .node_ports(a)
            .get(a_index)
            .copied()
            .ok_or_else(|| Error::connection(format!("node {a:?} has no port #{a_index}")))?;
        let pb = self
            .node_ports(b)
            .get(b_index)
            .copied()
            .ok_or_else(|| Error::connection(format!("node {b:?} has no port #{b_index}")))?;
        self.connect(pa, pb)
    }

    /// 拆除 cable：两端端口的 cable 引用清空，两个方向的投递通道停止。
    /// 在途帧丢失（不会重复投递）。未知 cable 返回 false，从不报错。
    #[tracing::instrument(skip(self))]
    pub fn disconnect(&mut self, id: CableId) -> bool {
        let Some(cable) = self.cables.get_mut(id.0).and_then(Option::take) else {
            warn!("cable 不存在，忽略");
            return false;
        };
        for end in cable.ends() {
            if let Some(port) = self.ports.get_mut(end) {
                port.remove_cable();
            }
            let owner = self.owner_of(end);
            if let Some(sw) = owner.and_then(|o| self.switch_mut(o)) {
                sw.forget_port(end);
            }
        }
        self.pending_wakes.retain(|(c, _)| *c != id);

        let in_flight = cable.in_flight();
        info!(in_flight, "cable 已断开");
        self.emit(VizEventKind::CableDisconnected {
            cable: id.0,
            in_flight,
        });
        for dir in [Direction::AtoB, Direction::BtoA] {
            if let Some(frame_id) = cable.channel(dir).in_flight {
                debug!(frame_id, "cable 已拆除，在途帧丢失");
                self.stats.lost_frames += 1;
                self.emit(VizEventKind::FrameLost {
                    cable: id.0,
                    frame_id,
                });
            }
        }
        true
    }

    // ---- 一轮仿真 ----

    /// 开始一轮仿真：清空 SAT、执行一次生成树、发布拓扑元信息，
    /// 并唤醒所有已有积压帧的通道和输入队列非空的消费者。
    #[tracing::instrument(skip(self, sim))]
    pub fn start_run(&mut self, sim: &mut Simulator) -> StpReport {
        self.now = sim.now();
        self.epoch = self.epoch.wrapping_add(1);
        self.clear_sats();
        self.reset_channels();

        let report = stp::compute(self);
        self.emit_meta();
        stp::publish(self, &report);

        self.pending_wakes.clear();
        for cable in self.cables.iter().flatten() {
            let [a, b] = cable.ends();
            for (port, dir) in [(a, Direction::AtoB), (b, Direction::BtoA)] {
                if self.ports.get(port).is_some_and(|p| !p.output().is_empty()) {
                    self.pending_wakes.push((cable.id(), dir));
                }
            }
        }
        self.flush_wakes(sim);

        // 上一轮的 PortRx 已随 epoch 作废，输入队列里的每一帧重新唤醒一次
        let backlog: Vec<(PortId, usize)> = self
            .ports
            .iter()
            .filter(|p| !p.input().is_empty())
            .map(|p| (p.id(), p.input().len()))
            .collect();
        for (port, queued) in backlog {
            for _ in 0..queued {
                self.notify_consumer(port, sim);
            }
        }
        info!(
            components = report.components.len(),
            blocked_cables = report.blocked_cables.len(),
            "▶️  仿真开始"
        );
        report
    }

    /// 结束一轮仿真：清空 SAT 与所有端口队列，旧一轮调度的事件不再生效
    pub fn stop_run(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.clear_sats();
        for port in self.ports.iter_mut() {
            port.clear_queues();
        }
        self.reset_channels();
        self.pending_wakes.clear();
        info!("⏹️  仿真结束");
    }

    /// 通道全部复位；仍在途的帧计为丢失
    fn reset_channels(&mut self) {
        let mut lost = Vec::new();
        for cable in self.cables.iter_mut().flatten() {
            let id = cable.id();
            for dir in [Direction::AtoB, Direction::BtoA] {
                let ch = cable.channel_mut(dir);
                ch.active = false;
                ch.wake_pending = false;
                if let Some(frame_id) = ch.in_flight.take() {
                    lost.push((id, frame_id));
                }
            }
        }
        for (cable, frame_id) in lost {
            debug!(frame_id, "新一轮开始，在途帧丢失");
            self.stats.lost_frames += 1;
            self.emit(VizEventKind::FrameLost {
                cable: cable.0,
                frame_id,
            });
        }
    }

    fn clear_sats(&mut self) {
        for id in self.switch_ids() {
            if let Some(sw) = self.switch_mut(id) {
                sw.clear_sat();
            }
        }
    }

    // ---- 帧 ----

    /// 创建帧，分配唯一 id
    pub fn make_frame(&mut self, src: MacAddr, dst: MacAddr, payload: impl Into<std::sync::Arc<[u8]>>) -> Frame {
        let id = self.next_frame_id;
        self.next_frame_id = self.next_frame_id.wrapping_add(1);
        Frame::new(id, src, dst, payload)
    }
}
