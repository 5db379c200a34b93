//! 路由表
//!
//! 静态查找的候选列表为 `手工表项 ++ 合成表项`。合成表项每次查询时重新
//! 生成、从不保存，顺序为：
//!
//! 1. 配置了网关时的默认路由 `0.0.0.0/0`；
//! 2. 回环 `127.0.0.0/8`；
//! 3. 每块网卡一条 `/32` 主机路由；
//! 4. 每块网卡一条直连网段路由（网络号 = IP AND 掩码）。
//!
//! 匹配规则：顺序遍历，只有掩码严格大于当前最优掩码、且
//! `target AND mask == network` 的候选才会替换当前最优。因此掩码相同时
//! 先出现者胜出，手工表项优先于同掩码的合成表项。

use std::net::Ipv4Addr;

use tracing::trace;

use super::nic::Interfaces;
use super::rip::RipTable;
use crate::error::{Error, Result};

pub const LOOPBACK_NET: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 0);
pub const LOOPBACK_MASK: Ipv4Addr = Ipv4Addr::new(255, 0, 0, 0);
pub const LOOPBACK_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;
pub const HOST_MASK: Ipv4Addr = Ipv4Addr::BROADCAST;

/// 网络号 = `ip AND mask`
pub fn network_id(ip: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) & u32::from(mask))
}

/// 一条路由：去往 `network/mask` 的帧经 `interface` 发往 `gateway`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub interface: Ipv4Addr,
}

impl RouteEntry {
    pub fn new(network: Ipv4Addr, mask: Ipv4Addr, gateway: Ipv4Addr, interface: Ipv4Addr) -> Self {
        Self {
            network,
            mask,
            gateway,
            interface,
        }
    }

    pub fn matches(&self, target: Ipv4Addr) -> bool {
        network_id(target, self.mask) == self.network
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    manual: Vec<RouteEntry>,
    /// `Some` 表示开启了动态路由
    dynamic: Option<RipTable>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_manual(&mut self, entry: RouteEntry) {
        self.manual.push(entry);
    }

    pub fn remove_manual(&mut self, index: usize) -> Option<RouteEntry> {
        (index < self.manual.len()).then(|| self.manual.remove(index))
    }

    pub fn clear_manual(&mut self) {
        self.manual.clear();
    }

    pub fn manual_entries(&self) -> &[RouteEntry] {
        &self.manual
    }

    /// 开启动态路由；已开启时保留已学到的路由。
    pub fn enable_dynamic(&mut self) -> &mut RipTable {
        self.dynamic.get_or_insert_with(RipTable::default)
    }

    pub fn disable_dynamic(&mut self) {
        self.dynamic = None;
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic.is_some()
    }

    pub fn rip(&self) -> Option<&RipTable> {
        self.dynamic.as_ref()
    }

    pub fn rip_mut(&mut self) -> Option<&mut RipTable> {
        self.dynamic.as_mut()
    }

    /// 合成表项（默认、回环、本机 /32、直连网段）
    pub fn synthetic_entries(nics: &Interfaces, gateway: Option<Ipv4Addr>) -> Vec<RouteEntry> {
        let mut out = Vec::with_capacity(2 + nics.len() * 2);

        if let Some(gw) = gateway {
            // 出接口取与网关同网段的网卡，找不到就用第一块网卡
            let egress = nics
                .iter()
                .find(|n| n.same_subnet(gw))
                .or_else(|| nics.first())
                .map(|n| n.ip)
                .unwrap_or(Ipv4Addr::UNSPECIFIED);
            out.push(RouteEntry::new(
                Ipv4Addr::UNSPECIFIED,
                Ipv4Addr::UNSPECIFIED,
                gw,
                egress,
            ));
        }

        out.push(RouteEntry::new(
            LOOPBACK_NET,
            LOOPBACK_MASK,
            LOOPBACK_ADDR,
            LOOPBACK_ADDR,
        ));

        for nic in nics.iter() {
            out.push(RouteEntry::new(nic.ip, HOST_MASK, LOOPBACK_ADDR, LOOPBACK_ADDR));
        }

        for nic in nics.iter() {
            out.push(RouteEntry::new(nic.network(), nic.mask, nic.ip, nic.ip));
        }

        out
    }

    /// 完整候选列表：手工表项在前
    pub fn entries(&self, nics: &Interfaces, gateway: Option<Ipv4Addr>) -> Vec<RouteEntry> {
        let mut all = self.manual.clone();
        all.extend(Self::synthetic_entries(nics, gateway));
        all
    }

    /// 查找去往 `target` 的最佳路由。开启动态路由时只查 RIP 表。
    pub fn best_route(
        &self,
        target: Ipv4Addr,
        nics: &Interfaces,
        gateway: Option<Ipv4Addr>,
    ) -> Result<RouteEntry> {
        if let Some(rip) = &self.dynamic {
            return rip.best_route(target);
        }
        longest_match(&self.entries(nics, gateway), target).ok_or(Error::NoRoute(target))
    }
}

/// 最长前缀匹配；掩码相同时保留先出现的表项
pub fn longest_match(entries: &[RouteEntry], target: Ipv4Addr) -> Option<RouteEntry> {
    let mut best: Option<RouteEntry> = None;
    for entry in entries {
        let wider = best.is_none_or(|b| u32::from(entry.mask) > u32::from(b.mask));
        if wider && entry.matches(target) {
            trace!(network = %entry.network, mask = %entry.mask, "候选路由");
            best = Some(*entry);
        }
    }
    best
}
