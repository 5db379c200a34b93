//! 拓扑构建
//!
//! 几个常用拓扑的构建函数，以及从 JSON 场景描述构建织物。

pub mod ring;
pub mod routed;
pub mod scenario;
pub mod star;
pub mod traffic;

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::net::{Fabric, MacAddr, NodeId, PortId};

/// 主机第一块网卡的端口与 MAC，用作发帧端点
pub fn endpoint(fabric: &Fabric, host: NodeId) -> Result<(PortId, MacAddr)> {
    let nic = fabric
        .interface_node(host)?
        .interfaces()
        .first()
        .ok_or(Error::NotInterfaceNode(host))?;
    Ok((nic.port, nic.mac))
}

/// 前缀长度转掩码（`24` → `255.255.255.0`）
/// 第 `i` 台主机地址的末字节（`base + i`），超出 1..=254 时报错
pub fn host_octet(base: usize, i: usize) -> Result<u8> {
    base.checked_add(i)
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| (1..=254).contains(v))
        .ok_or_else(|| Error::Scenario(format!("host #{i} does not fit a /24 starting at .{base}")))
}

pub fn prefix_mask(len: u8) -> Ipv4Addr {
    let len = u32::from(len.min(32));
    let bits = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    Ipv4Addr::from(bits)
}
