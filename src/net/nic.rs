//! 网卡（NetworkInterface）
//!
//! 每块网卡独占一个端口，带一个 IP、一个子网掩码和一个 MAC。

use std::net::Ipv4Addr;

use super::id::PortId;
use super::mac::MacAddr;
use super::routing::network_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub port: PortId,
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub mac: MacAddr,
}

impl NetworkInterface {
    pub fn new(port: PortId, ip: Ipv4Addr, mask: Ipv4Addr, mac: MacAddr) -> Self {
        Self { port, ip, mask, mac }
    }

    /// 网络号 = IP AND 掩码
    pub fn network(&self) -> Ipv4Addr {
        network_id(self.ip, self.mask)
    }

    /// `addr` 是否落在本网卡的子网内
    pub fn same_subnet(&self, addr: Ipv4Addr) -> bool {
        network_id(addr, self.mask) == self.network()
    }
}

/// 有序网卡列表。节点的端口列表按这里的顺序派生。
#[derive(Debug, Clone, Default)]
pub struct Interfaces {
    nics: Vec<NetworkInterface>,
}

impl Interfaces {
    pub fn push(&mut self, nic: NetworkInterface) {
        self.nics.push(nic);
    }

    pub fn remove_by_port(&mut self, port: PortId) -> Option<NetworkInterface> {
        let idx = self.nics.iter().position(|n| n.port == port)?;
        Some(self.nics.remove(idx))
    }

    pub fn by_ip(&self, ip: Ipv4Addr) -> Option<&NetworkInterface> {
        self.nics.iter().find(|n| n.ip == ip)
    }

    pub fn by_mac(&self, mac: MacAddr) -> Option<&NetworkInterface> {
        self.nics.iter().find(|n| n.mac == mac)
    }

    pub fn by_port(&self, port: PortId) -> Option<&NetworkInterface> {
        self.nics.iter().find(|n| n.port == port)
    }

    pub fn by_port_mut(&mut self, port: PortId) -> Option<&mut NetworkInterface> {
        self.nics.iter_mut().find(|n| n.port == port)
    }

    pub fn first(&self) -> Option<&NetworkInterface> {
        self.nics.first()
    }

    pub fn ports(&self) -> Vec<PortId> {
        self.nics.iter().map(|n| n.port).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkInterface> {
        self.nics.iter()
    }

    pub fn len(&self) -> usize {
        self.nics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nics.is_empty()
    }
}
