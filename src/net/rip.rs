//! 动态学习的路由（RIP 风格）
//!
//! 只维护路由集合本身；通告报文的收发属于上层协议。查询时优先跳数严格更少
//! 的路由，跳数相同则掩码更长者胜出。

use std::net::Ipv4Addr;

use tracing::debug;

use super::nic::Interfaces;
use super::routing::{RouteEntry, network_id};
use crate::error::{Error, Result};
use crate::sim::SimTime;

/// 跳数达到该值即视为不可达
pub const INFINITY: u32 = 16;

/// 学到的路由超过该时长未刷新即失效
pub const RIP_TIMEOUT: SimTime = SimTime::from_secs(180);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipRoute {
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub next_hop: Ipv4Addr,
    pub interface: Ipv4Addr,
    pub hops: u32,
    pub learned_at: SimTime,
    /// 直连网段：不会过期
    pub connected: bool,
}

impl RipRoute {
    pub fn learned(
        network: Ipv4Addr,
        mask: Ipv4Addr,
        next_hop: Ipv4Addr,
        interface: Ipv4Addr,
        hops: u32,
    ) -> Self {
        Self {
            network: network_id(network, mask),
            mask,
            next_hop,
            interface,
            hops,
            learned_at: SimTime::ZERO,
            connected: false,
        }
    }

    fn same_prefix(&self, other: &RipRoute) -> bool {
        self.network == other.network && self.mask == other.mask
    }

    fn entry(&self) -> RouteEntry {
        RouteEntry::new(self.network, self.mask, self.next_hop, self.interface)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RipTable {
    routes: Vec<RipRoute>,
}

impl RipTable {
    pub fn routes(&self) -> &[RipRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// 为每块网卡写入 0 跳直连路由（已存在的直连表项先清掉）
    pub fn seed_connected(&mut self, nics: &Interfaces, now: SimTime) {
        self.routes.retain(|r| !r.connected);
        for nic in nics.iter() {
            self.routes.push(RipRoute {
                network: nic.network(),
                mask: nic.mask,
                next_hop: nic.ip,
                interface: nic.ip,
                hops: 0,
                learned_at: now,
                connected: true,
            });
        }
    }

    /// 合并一条通告来的路由；返回表是否发生变化。
    ///
    /// 新前缀直接插入；已有前缀仅在跳数严格更少时替换，或者通告来自同一
    /// 下一跳时刷新（跳数随之更新，达到 `INFINITY` 则删除）。
    pub fn learn(&mut self, mut route: RipRoute, now: SimTime) -> bool {
        route.network = network_id(route.network, route.mask);
        route.learned_at = now;
        route.connected = false;

        let Some(idx) = self.routes.iter().position(|r| r.same_prefix(&route)) else {
            if route.hops >= INFINITY {
                return false;
            }
            debug!(network = %route.network, hops = route.hops, "RIP 新路由");
            self.routes.push(route);
            return true;
        };

        let existing = &mut self.routes[idx];
        if existing.connected {
            return false;
        }
        if existing.next_hop == route.next_hop {
            if route.hops >= INFINITY {
                self.routes.remove(idx);
                return true;
            }
            let changed = existing.hops != route.hops;
            *existing = route;
            return changed;
        }
        if route.hops < existing.hops {
            *existing = route;
            return true;
        }
        false
    }

    /// 删除超时的学习路由，返回删除条数
    pub fn expire(&mut self, now: SimTime) -> usize {
        let before = self.routes.len();
        self.routes
            .retain(|r| r.connected || now.0.saturating_sub(r.learned_at.0) < RIP_TIMEOUT.0);
        before - self.routes.len()
    }

    pub fn best_route(&self, target: Ipv4Addr) -> Result<RouteEntry> {
        let mut best: Option<&RipRoute> = None;
        for r in self.routes.iter().filter(|r| r.hops < INFINITY) {
            if network_id(target, r.mask) != r.network {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    r.hops < b.hops || (r.hops == b.hops && u32::from(r.mask) > u32::from(b.mask))
                }
            };
            if better {
                best = Some(r);
            }
        }
        best.map(RipRoute::entry).ok_or(Error::NoRoute(target))
    }
}
