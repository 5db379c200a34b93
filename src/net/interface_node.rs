//! 基于网卡的节点：主机与路由器
//!
//! 端口列表由网卡列表派生，额外支持按 IP、MAC、端口查找网卡。
//! 每个节点拥有一张路由表；开启动态路由后路由查询改走 RIP 表。

use std::net::Ipv4Addr;

use tracing::debug;

use super::id::{NodeId, PortId};
use super::nic::{Interfaces, NetworkInterface};
use super::node::{Node, NodeKind};
use super::routing::{RouteEntry, RoutingTable};
use crate::error::Result;
use crate::sim::SimTime;

#[derive(Debug)]
pub struct InterfaceNode {
    id: NodeId,
    name: String,
    kind: NodeKind,
    nics: Interfaces,
    gateway: Option<Ipv4Addr>,
    routing: RoutingTable,
}

impl InterfaceNode {
    /// 创建主机
    pub fn host(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Host)
    }

    /// 创建路由器
    pub fn router(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Router)
    }

    fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            nics: Interfaces::default(),
            gateway: None,
            routing: RoutingTable::default(),
        }
    }

    pub fn interfaces(&self) -> &Interfaces {
        &self.nics
    }

    pub(crate) fn interfaces_mut(&mut self) -> &mut Interfaces {
        &mut self.nics
    }

    pub fn interface_by_ip(&self, ip: Ipv4Addr) -> Option<&NetworkInterface> {
        self.nics.by_ip(ip)
    }

    pub fn interface_by_port(&self, port: PortId) -> Option<&NetworkInterface> {
        self.nics.by_port(port)
    }

    pub fn gateway(&self) -> Option<Ipv4Addr> {
        self.gateway
    }

    pub fn set_gateway(&mut self, gateway: Option<Ipv4Addr>) {
        self.gateway = gateway;
    }

    /// 动态路由开启时，按当前网卡重写直连路由
    pub(crate) fn reseed_rip(&mut self, now: SimTime) {
        if let Some(rip) = self.routing.rip_mut() {
            rip.seed_connected(&self.nics, now);
        }
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    /// 合并后的路由表（手工表项 + 合成表项），按匹配顺序排列
    pub fn route_entries(&self) -> Vec<RouteEntry> {
        self.routing.entries(&self.nics, self.gateway)
    }

    #[tracing::instrument(skip(self), fields(node_name = %self.name))]
    pub fn best_route(&self, target: Ipv4Addr) -> Result<RouteEntry> {
        let route = self.routing.best_route(target, &self.nics, self.gateway)?;
        debug!(gateway = %route.gateway, interface = %route.interface, "🧭 路由命中");
        Ok(route)
    }
}

impl Node for InterfaceNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn port_list(&self) -> Vec<PortId> {
        self.nics.ports()
    }

    fn port_count(&self) -> usize {
        self.nics.len()
    }

    fn as_interface_node(&self) -> Option<&InterfaceNode> {
        Some(self)
    }

    fn as_interface_node_mut(&mut self) -> Option<&mut InterfaceNode> {
        Some(self)
    }
}
