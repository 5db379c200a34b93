//! 交换机环
//!
//! `n` 台交换机首尾相连（n = 3 即三角形），每台交换机下挂若干主机。
//! 环上恰有一个回路，生成树应恰好阻断一条链路。

use std::net::Ipv4Addr;

use super::{host_octet, prefix_mask};
use crate::error::Result;
use crate::net::{CableId, Fabric, NodeId};

#[derive(Debug, Clone)]
pub struct RingOpts {
    pub switches: usize,
    pub hosts_per_switch: usize,
}

impl Default for RingOpts {
    fn default() -> Self {
        Self {
            switches: 3,
            hosts_per_switch: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RingTopology {
    pub switches: Vec<NodeId>,
    /// `hosts[i]` 挂在 `switches[i / hosts_per_switch]` 下
    pub hosts: Vec<NodeId>,
    /// `ring_cables[i]` 连接 `switches[i]` 与 `switches[(i + 1) % n]`
    pub ring_cables: Vec<CableId>,
}

/// 构建交换机环；主机地址为 `10.0.0.x/24`
pub fn build_switch_ring(fabric: &mut Fabric, opts: &RingOpts) -> Result<RingTopology> {
    let n = opts.switches;
    let ports = 2 + opts.hosts_per_switch;
    let total = n.saturating_mul(opts.hosts_per_switch);
    if total > 0 {
        host_octet(1, total - 1)?;
    }

    let switches: Vec<NodeId> = (0..n)
        .map(|i| fabric.add_switch(format!("s{i}"), ports))
        .collect();

    let mut hosts = Vec::with_capacity(n * opts.hosts_per_switch);
    for (i, &sw) in switches.iter().enumerate() {
        for j in 0..opts.hosts_per_switch {
            let idx = i * opts.hosts_per_switch + j;
            let h = fabric.add_host(format!("h{idx}"));
            let ip = Ipv4Addr::new(10, 0, 0, host_octet(1, idx)?);
            fabric.add_interface(h, ip, prefix_mask(24))?;
            fabric.connect_nodes(h, sw)?;
            hosts.push(h);
        }
    }

    // 一台交换机没有环；两台时是两条平行链路
    let mut ring_cables = Vec::with_capacity(n);
    if n >= 2 {
        for i in 0..n {
            ring_cables.push(fabric.connect_nodes(switches[i], switches[(i + 1) % n])?);
        }
    }

    Ok(RingTopology {
        switches,
        hosts,
        ring_cables,
    })
}
