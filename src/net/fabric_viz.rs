//! Event publishing hooks for the fabric.

use tracing::trace;

use super::fabric::Fabric;
use super::frame::Frame;
use super::id::{NodeId, PortId};
use super::mac::MacAddr;
use crate::viz::{VizCableInfo, VizDropReason, VizEvent, VizEventKind, VizNodeInfo};

impl Fabric {
    pub(crate) fn emit(&mut self, kind: VizEventKind) {
        if self.observers.is_empty() {
            return;
        }
        let ev = VizEvent {
            t_ns: self.now.0,
            kind,
        };
        for obs in &mut self.observers {
            obs.on_event(&ev);
        }
    }

    /// Snapshot of nodes and cables, including current port statuses.
    pub fn emit_meta(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let nodes = self
            .node_ids()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|n| VizNodeInfo {
                id: n.id().0,
                name: n.name().to_string(),
                kind: n.kind(),
                ports: n.port_list().into_iter().map(|p| p.0).collect(),
            })
            .collect::<Vec<_>>();
        let delay_ns = self.cfg.link_delay().0;
        let cables = self
            .cables
            .iter()
            .flatten()
            .map(|c| {
                let [a, b] = c.ends();
                VizCableInfo {
                    id: c.id().0,
                    port_a: a.0,
                    port_b: b.0,
                    status_a: self.port_status(a).unwrap_or_default(),
                    status_b: self.port_status(b).unwrap_or_default(),
                    blocked: c.is_blocked(),
                    delay_ns,
                }
            })
            .collect::<Vec<_>>();
        self.emit(VizEventKind::Meta { nodes, cables });
    }

    pub(crate) fn drop_frame(&mut self, node: NodeId, port: PortId, frame: &Frame, reason: VizDropReason) {
        match reason {
            VizDropReason::BlockedPort => self.stats.dropped_blocked += 1,
            VizDropReason::Filtered => self.stats.filtered += 1,
        }
        self.emit(VizEventKind::FrameDropped {
            port: port.0,
            node: node.0,
            frame_id: frame.id(),
            reason,
        });
    }

    pub(crate) fn note_learned(&mut self, switch: NodeId, mac: MacAddr, port: PortId) {
        trace!(switch = ?switch, %mac, port = ?port, "SAT learned");
        self.emit(VizEventKind::SatLearned {
            switch: switch.0,
            mac: mac.to_string(),
            port: port.0,
        });
    }

    pub(crate) fn note_forwarded(&mut self, node: NodeId, from: PortId, to: PortId, frame: &Frame) {
        self.stats.unicast_frames += 1;
        self.emit(VizEventKind::Forwarded {
            node: node.0,
            from_port: from.0,
            to_port: to.0,
            frame_id: frame.id(),
        });
    }

    pub(crate) fn note_flooded(&mut self, node: NodeId, from: PortId, to: &[PortId], frame: &Frame) {
        self.stats.flooded_frames += 1;
        self.emit(VizEventKind::Flooded {
            node: node.0,
            from_port: from.0,
            to_ports: to.iter().map(|p| p.0).collect(),
            frame_id: frame.id(),
        });
    }
}
