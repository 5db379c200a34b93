//! 网络织物模块
//!
//! 端口、cable、节点、交换机转发与路由表。

// 子模块声明
mod cable;
mod deliver;
mod fabric;
mod fabric_viz;
mod fabric_world;
mod frame;
mod hub;
mod id;
mod interface_node;
mod mac;
mod nic;
mod node;
mod observer;
mod port;
mod rip;
mod routing;
mod stats;
mod switch;

// 重新导出公共接口
pub use cable::{Cable, Channel, Direction};
pub use deliver::{DeliverFrame, PortRx, WakeChannel};
pub use fabric::Fabric;
pub use fabric_world::FabricWorld;
pub use frame::Frame;
pub use hub::Hub;
pub use id::{CableId, NodeId, PortId};
pub use interface_node::InterfaceNode;
pub use mac::MacAddr;
pub use nic::{Interfaces, NetworkInterface};
pub use node::{FixedPorts, Node, NodeKind};
pub use observer::FabricObserver;
pub use port::{Port, PortStatus, Ports};
pub use rip::{INFINITY, RIP_TIMEOUT, RipRoute, RipTable};
pub use routing::{RouteEntry, RoutingTable, longest_match, network_id};
pub use stats::Stats;
pub use switch::{Sat, Switch};
