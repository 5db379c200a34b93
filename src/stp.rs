//! 生成树（环路消除）
//!
//! 不是真正的 STP 协议：没有 bridge id，也不交换 BPDU。每轮仿真开始前对
//! 交换机子图做一次离线计算，把会形成转发环路的链路两端端口置为 `Blocked`。
//!
//! 1. 复位：所有交换机 `connected_to_root = false`，交换机端口置 `Empty`，
//!    所有 cable 的 `blocked` 清零；
//! 2. 按登记顺序取第一个未访问的交换机作为新分量的根；
//! 3. 从根出发广度优先扩展：邻居已经连到根则阻断链路两端，否则两端置
//!    `Used` 并把邻居加入分量；没连 cable 的端口直接阻断；
//! 4. 对剩余的不连通分量重复第 2 步。
//!
//! 每个交换机恰好被分配到一个分量一次，所以任何拓扑（包括已经算过一次的）
//! 都能一次终止，重复执行结果相同。

use std::collections::VecDeque;

use tracing::{debug, info, trace};

use crate::net::{CableId, Fabric, NodeId, PortId, PortStatus};
use crate::viz::VizEventKind;

/// 一次生成树计算的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StpReport {
    /// 每个分量的交换机，第一个是根
    pub components: Vec<Vec<NodeId>>,
    /// 被阻断的交换机间链路
    pub blocked_cables: Vec<CableId>,
    /// 所有被置为 `Blocked` 的端口（含未连线的端口）
    pub blocked_ports: Vec<PortId>,
    pub used_ports: Vec<PortId>,
}

impl StpReport {
    pub fn roots(&self) -> Vec<NodeId> {
        self.components.iter().filter_map(|c| c.first().copied()).collect()
    }

    /// `node` 所在分量的根
    pub fn root_of(&self, node: NodeId) -> Option<NodeId> {
        self.components
            .iter()
            .find(|c| c.contains(&node))
            .and_then(|c| c.first().copied())
    }
}

fn is_connected_to_root(fabric: &Fabric, sw: NodeId) -> bool {
    fabric.switch(sw).is_some_and(|s| s.connected_to_root())
}

fn mark_connected(fabric: &mut Fabric, sw: NodeId) {
    if let Some(s) = fabric.switch_mut(sw) {
        s.set_connected_to_root(true);
    }
}

fn reset(fabric: &mut Fabric, switches: &[NodeId]) {
    for &sw in switches {
        if let Some(s) = fabric.switch_mut(sw) {
            s.set_connected_to_root(false);
        }
        for port in fabric.node_ports(sw) {
            fabric.set_port_status(port, PortStatus::Empty);
        }
    }
    for cable in fabric.cable_ids() {
        if let Some(c) = fabric.cable_mut(cable) {
            c.set_blocked(false);
        }
    }
}

/// 对 `fabric` 中的交换机执行一次生成树计算，并发布结果事件
pub fn apply(fabric: &mut Fabric) -> StpReport {
    let report = compute(fabric);
    publish(fabric, &report);
    report
}

pub(crate) fn publish(fabric: &mut Fabric, report: &StpReport) {
    fabric.emit(VizEventKind::SpanningTree {
        roots: report.roots().into_iter().map(|n| n.0).collect(),
        blocked_cables: report.blocked_cables.iter().map(|c| c.0).collect(),
        blocked_ports: report.blocked_ports.iter().map(|p| p.0).collect(),
    });
}

#[tracing::instrument(skip(fabric))]
pub(crate) fn compute(fabric: &mut Fabric) -> StpReport {
    let switches = fabric.switch_ids();
    reset(fabric, &switches);

    let mut report = StpReport::default();
    for &root in &switches {
        if is_connected_to_root(fabric, root) {
            continue;
        }
        debug!(root = ?root, "🌲 新分量的根");
        mark_connected(fabric, root);
        let mut component = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(sw) = queue.pop_front() {
            for port in fabric.node_ports(sw) {
                // 已从另一端处理过
                if fabric.port_status(port) != Some(PortStatus::Empty) {
                    continue;
                }
                let Some(cable) = fabric.port(port).and_then(|p| p.cable()) else {
                    fabric.set_port_status(port, PortStatus::Blocked);
                    report.blocked_ports.push(port);
                    continue;
                };
                let Some(remote) = fabric.remote_port(port) else {
                    continue;
                };
                let Some(neighbor) = fabric.owner_of(remote) else {
                    continue;
                };
                if fabric.switch(neighbor).is_none() {
                    // 主机、路由器、集线器不参与
                    continue;
                }

                if is_connected_to_root(fabric, neighbor) {
                    trace!(switch = ?sw, neighbor = ?neighbor, cable = ?cable, "形成环路，阻断链路");
                    fabric.set_port_status(port, PortStatus::Blocked);
                    fabric.set_port_status(remote, PortStatus::Blocked);
                    if let Some(c) = fabric.cable_mut(cable) {
                        c.set_blocked(true);
                    }
                    report.blocked_cables.push(cable);
                    report.blocked_ports.extend([port, remote]);
                } else {
                    trace!(switch = ?sw, neighbor = ?neighbor, "加入生成树");
                    fabric.set_port_status(port, PortStatus::Used);
                    fabric.set_port_status(remote, PortStatus::Used);
                    report.used_ports.extend([port, remote]);
                    mark_connected(fabric, neighbor);
                    component.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        report.components.push(component);
    }

    info!(
        switches = switches.len(),
        components = report.components.len(),
        blocked_cables = report.blocked_cables.len(),
        "生成树计算完成"
    );
    report
}
