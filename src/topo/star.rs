//! 星型局域网：一台交换机 + N 台主机

use std::net::Ipv4Addr;

use super::{host_octet, prefix_mask};
use crate::error::{Error, Result};
use crate::net::{Fabric, NodeId, PortId};

#[derive(Debug, Clone)]
pub struct StarOpts {
    pub hosts: usize,
    /// 交换机端口数；不足时按主机数分配
    pub switch_ports: usize,
}

impl Default for StarOpts {
    fn default() -> Self {
        Self {
            hosts: 3,
            switch_ports: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StarTopology {
    pub switch: NodeId,
    pub hosts: Vec<NodeId>,
    /// `switch_ports[i]` 是连接 `hosts[i]` 的交换机端口
    pub switch_ports: Vec<PortId>,
}

/// 构建星型局域网；主机地址为 `192.168.0.(10+i)/24`
pub fn build_star_lan(fabric: &mut Fabric, opts: &StarOpts) -> Result<StarTopology> {
    if opts.hosts > 0 {
        host_octet(10, opts.hosts - 1)?;
    }
    let sw = fabric.add_switch("s0", opts.switch_ports.max(opts.hosts));
    let mut hosts = Vec::with_capacity(opts.hosts);
    let mut switch_ports = Vec::with_capacity(opts.hosts);

    for i in 0..opts.hosts {
        let h = fabric.add_host(format!("h{i}"));
        let ip = Ipv4Addr::new(192, 168, 0, host_octet(10, i)?);
        let nic_port = fabric.add_interface(h, ip, prefix_mask(24))?;
        let sw_port = fabric
            .free_port(sw)
            .ok_or_else(|| Error::connection(format!("switch {sw:?} has no free port")))?;
        fabric.connect(nic_port, sw_port)?;
        hosts.push(h);
        switch_ports.push(sw_port);
    }

    Ok(StarTopology {
        switch: sw,
        hosts,
        switch_ports,
    })
}
