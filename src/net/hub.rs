//! 集线器：把收到的每一帧原样转发到其他所有已连接端口。
//! 不学习地址，也不看端口状态。

use tracing::debug;

use super::fabric::Fabric;
use super::frame::Frame;
use super::id::{NodeId, PortId};
use super::node::{FixedPorts, Node, NodeKind};
use super::port::Ports;
use crate::sim::Simulator;

#[derive(Debug)]
pub struct Hub {
    id: NodeId,
    name: String,
    ports: FixedPorts,
}

impl Hub {
    pub fn new(id: NodeId, name: impl Into<String>, port_count: usize, arena: &mut Ports) -> Self {
        Self {
            id,
            name: name.into(),
            ports: FixedPorts::allocate(id, port_count, arena),
        }
    }

    pub fn port(&self, index: usize) -> Option<PortId> {
        self.ports.get(index)
    }
}

impl Node for Hub {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Hub
    }

    fn port_list(&self) -> Vec<PortId> {
        self.ports.as_slice().to_vec()
    }

    fn port_index(&self, port: PortId) -> Option<usize> {
        self.ports.index_of(port)
    }

    fn consumes_input(&self) -> bool {
        true
    }

    fn on_frame(&mut self, ingress: PortId, frame: Frame, sim: &mut Simulator, fabric: &mut Fabric) {
        let targets: Vec<PortId> = self
            .ports
            .as_slice()
            .iter()
            .copied()
            .filter(|p| *p != ingress && fabric.port(*p).is_some_and(|port| port.is_connected()))
            .collect();
        debug!(hub = %self.name, frame_id = frame.id(), targets = targets.len(), "📢 Hub 转发");
        fabric.note_flooded(self.id, ingress, &targets, &frame);
        for p in targets {
            fabric.push_output(p, frame.clone(), sim);
        }
    }
}
