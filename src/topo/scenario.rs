//! JSON 场景描述
//!
//! 描述节点、网卡、cable 和要注入的流量，供命令行工具加载：
//!
//! ```json
//! {
//!   "config": { "delay_factor": 1, "rtt_factor": 2 },
//!   "nodes": [
//!     { "kind": "switch", "name": "s1", "ports": 4 },
//!     { "kind": "host", "name": "a", "interfaces": [ { "ip": "10.0.0.1", "mask": "255.255.255.0" } ] }
//!   ],
//!   "cables": [ { "a": "a", "b": "s1" } ],
//!   "traffic": [ { "from": "a", "to": "b", "count": 3 } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::endpoint;
use super::traffic::InjectFrames;
use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::net::{Fabric, MacAddr, NodeId, RouteEntry};
use crate::sim::{SimTime, Simulator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub config: Option<SimConfig>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub cables: Vec<CableSpec>,
    #[serde(default)]
    pub traffic: Vec<TrafficSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    Switch {
        name: String,
        #[serde(default = "default_ports")]
        ports: usize,
    },
    Hub {
        name: String,
        #[serde(default = "default_ports")]
        ports: usize,
    },
    Host {
        name: String,
        #[serde(default)]
        interfaces: Vec<InterfaceSpec>,
        #[serde(default)]
        gateway: Option<Ipv4Addr>,
        #[serde(default)]
        routes: Vec<RouteSpec>,
    },
    Router {
        name: String,
        #[serde(default)]
        interfaces: Vec<InterfaceSpec>,
        #[serde(default)]
        gateway: Option<Ipv4Addr>,
        #[serde(default)]
        routes: Vec<RouteSpec>,
        #[serde(default)]
        dynamic_routing: bool,
    },
}

fn default_ports() -> usize {
    8
}

impl NodeSpec {
    pub fn name(&self) -> &str {
        match self {
            NodeSpec::Switch { name, .. }
            | NodeSpec::Hub { name, .. }
            | NodeSpec::Host { name, .. }
            | NodeSpec::Router { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
    #[serde(default)]
    pub mac: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub network: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub interface: Ipv4Addr,
}

/// 端口下标省略时使用节点的第一个空闲端口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CableSpec {
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub a_port: Option<usize>,
    #[serde(default)]
    pub b_port: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSpec {
    pub from: String,
    /// 目的节点；省略时发广播帧
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default)]
    pub at_ms: u64,
    #[serde(default)]
    pub gap_ms: u64,
    #[serde(default = "default_bytes")]
    pub bytes: usize,
}

fn default_count() -> u64 {
    1
}

fn default_bytes() -> usize {
    64
}

/// 构建结果：名字到节点的映射
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub nodes: BTreeMap<String, NodeId>,
}

impl Scenario {
    pub fn node(&self, name: &str) -> Result<NodeId> {
        self.nodes
            .get(name)
            .copied()
            .ok_or_else(|| Error::Scenario(format!("unknown node name {name:?}")))
    }
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// 在 `fabric` 中创建场景描述的节点和 cable
    pub fn build(&self, fabric: &mut Fabric) -> Result<Scenario> {
        let mut scenario = Scenario::default();

        for spec in &self.nodes {
            if scenario.nodes.contains_key(spec.name()) {
                return Err(Error::Scenario(format!(
                    "duplicate node name {:?}",
                    spec.name()
                )));
            }
            let id = match spec {
                NodeSpec::Switch { name, ports } => fabric.add_switch(name.clone(), *ports),
                NodeSpec::Hub { name, ports } => fabric.add_hub(name.clone(), *ports),
                NodeSpec::Host {
                    name,
                    interfaces,
                    gateway,
                    routes,
                } => {
                    let id = fabric.add_host(name.clone());
                    configure_interfaces(fabric, id, interfaces, *gateway, routes)?;
                    id
                }
                NodeSpec::Router {
                    name,
                    interfaces,
                    gateway,
                    routes,
                    dynamic_routing,
                } => {
                    let id = fabric.add_router(name.clone());
                    configure_interfaces(fabric, id, interfaces, *gateway, routes)?;
                    fabric.set_dynamic_routing(id, *dynamic_routing)?;
                    id
                }
            };
            scenario.nodes.insert(spec.name().to_string(), id);
        }

        for cable in &self.cables {
            let a = scenario.node(&cable.a)?;
            let b = scenario.node(&cable.b)?;
            match (cable.a_port, cable.b_port) {
                (Some(pa), Some(pb)) => fabric.connect_port_indices(a, pa, b, pb)?,
                (None, None) => fabric.connect_nodes(a, b)?,
                (pa, pb) => {
                    let pa = match pa {
                        Some(i) => i,
                        None => first_free_index(fabric, a)?,
                    };
                    let pb = match pb {
                        Some(i) => i,
                        None => first_free_index(fabric, b)?,
                    };
                    fabric.connect_port_indices(a, pa, b, pb)?
                }
            };
        }

        info!(
            nodes = scenario.nodes.len(),
            cables = self.cables.len(),
            "场景已构建"
        );
        Ok(scenario)
    }

    /// 把场景里的流量调度到仿真器上
    pub fn schedule_traffic(
        &self,
        scenario: &Scenario,
        fabric: &Fabric,
        sim: &mut Simulator,
    ) -> Result<()> {
        for t in &self.traffic {
            let from = scenario.node(&t.from)?;
            let (port, src) = endpoint(fabric, from)?;
            let dst = match &t.to {
                Some(to) => endpoint(fabric, scenario.node(to)?)?.1,
                None => MacAddr::BROADCAST,
            };
            sim.schedule(
                SimTime::from_millis(t.at_ms),
                InjectFrames {
                    port,
                    src,
                    dst,
                    payload_bytes: t.bytes,
                    remaining: t.count,
                    gap: SimTime::from_millis(t.gap_ms),
                },
            );
        }
        Ok(())
    }
}

fn first_free_index(fabric: &Fabric, node: NodeId) -> Result<usize> {
    let node_ref = fabric.node(node).ok_or(Error::UnknownNode(node))?;
    fabric
        .free_port(node)
        .and_then(|p| node_ref.port_index(p))
        .ok_or_else(|| Error::connection(format!("node {node:?} has no free port")))
}

fn configure_interfaces(
    fabric: &mut Fabric,
    node: NodeId,
    interfaces: &[InterfaceSpec],
    gateway: Option<Ipv4Addr>,
    routes: &[RouteSpec],
) -> Result<()> {
    for nic in interfaces {
        match &nic.mac {
            Some(mac) => {
                let mac: MacAddr = mac.parse()?;
                fabric.add_interface_with_mac(node, nic.ip, nic.mask, mac)?;
            }
            None => {
                fabric.add_interface(node, nic.ip, nic.mask)?;
            }
        }
    }
    fabric.set_gateway(node, gateway)?;
    for r in routes {
        fabric.add_route(
            node,
            RouteEntry::new(r.network, r.mask, r.gateway, r.interface),
        )?;
    }
    Ok(())
}
