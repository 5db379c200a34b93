//! 两个局域网经一台路由器互联
//!
//! 拓扑结构：h0 <-> s0 <-> r0 <-> s1 <-> h1
//! - LAN A：192.168.1.0/24，h0 = .10，r0 = .1
//! - LAN B：192.168.2.0/24，h1 = .10，r0 = .1

use std::net::Ipv4Addr;

use super::prefix_mask;
use crate::error::Result;
use crate::net::{Fabric, NodeId};

#[derive(Debug, Clone)]
pub struct RoutedTopology {
    pub h0: NodeId,
    pub h1: NodeId,
    pub s0: NodeId,
    pub s1: NodeId,
    pub router: NodeId,
}

pub fn build_routed_pair(fabric: &mut Fabric) -> Result<RoutedTopology> {
    let mask = prefix_mask(24);
    let gw_a = Ipv4Addr::new(192, 168, 1, 1);
    let gw_b = Ipv4Addr::new(192, 168, 2, 1);

    let h0 = fabric.add_host("h0");
    let h1 = fabric.add_host("h1");
    let s0 = fabric.add_switch("s0", 4);
    let s1 = fabric.add_switch("s1", 4);
    let router = fabric.add_router("r0");

    fabric.add_interface(h0, Ipv4Addr::new(192, 168, 1, 10), mask)?;
    fabric.add_interface(h1, Ipv4Addr::new(192, 168, 2, 10), mask)?;
    fabric.add_interface(router, gw_a, mask)?;
    fabric.add_interface(router, gw_b, mask)?;
    fabric.set_gateway(h0, Some(gw_a))?;
    fabric.set_gateway(h1, Some(gw_b))?;

    fabric.connect_nodes(h0, s0)?;
    fabric.connect_nodes(h1, s1)?;
    // 路由器的网卡按添加顺序：#0 在 LAN A，#1 在 LAN B
    fabric.connect_port_indices(router, 0, s0, 1)?;
    fabric.connect_port_indices(router, 1, s1, 1)?;

    Ok(RoutedTopology {
        h0,
        h1,
        s0,
        s1,
        router,
    })
}
