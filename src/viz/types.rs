use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::net::{FabricObserver, NodeKind, PortStatus};

/// 可视化事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 拓扑元信息（建议作为第一条事件）
    Meta {
        nodes: Vec<VizNodeInfo>,
        cables: Vec<VizCableInfo>,
    },
    CableConnected {
        cable: usize,
        port_a: usize,
        port_b: usize,
    },
    /// 断开时仍在途的帧数（这些帧会丢失）
    CableDisconnected { cable: usize, in_flight: usize },
    /// 通道取出一帧开始传播
    CableActive {
        cable: usize,
        from_port: usize,
        to_port: usize,
        frame_id: u64,
        arrive_ns: u64,
    },
    /// 通道输出队列空，进入空闲
    CableIdle { cable: usize, from_port: usize },
    /// 帧进入对端输入队列
    FrameDelivered {
        port: usize,
        node: usize,
        frame_id: u64,
    },
    /// cable 在传播途中被拆除
    FrameLost { cable: usize, frame_id: u64 },
    FrameDropped {
        port: usize,
        node: usize,
        frame_id: u64,
        reason: VizDropReason,
    },
    SatLearned {
        switch: usize,
        mac: String,
        port: usize,
    },
    Forwarded {
        node: usize,
        from_port: usize,
        to_port: usize,
        frame_id: u64,
    },
    Flooded {
        node: usize,
        from_port: usize,
        to_ports: Vec<usize>,
        frame_id: u64,
    },
    /// 生成树计算结果
    SpanningTree {
        roots: Vec<usize>,
        blocked_cables: Vec<usize>,
        blocked_ports: Vec<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizDropReason {
    /// 入端口被生成树阻断
    BlockedPort,
    /// 学到的出端口就是入端口
    Filtered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizNodeInfo {
    pub id: usize,
    pub name: String,
    pub kind: NodeKind,
    pub ports: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizCableInfo {
    pub id: usize,
    pub port_a: usize,
    pub port_b: usize,
    pub status_a: PortStatus,
    pub status_b: PortStatus,
    pub blocked: bool,
    /// 单向传播时延（ns）
    pub delay_ns: u64,
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.events)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl FabricObserver for VizLogger {
    fn on_event(&mut self, ev: &VizEvent) {
        self.push(ev.clone());
    }
}

/// 可共享的事件日志：一份交给 `Fabric::subscribe`，另一份留给调用方读取。
#[derive(Debug, Clone, Default)]
pub struct SharedLog(Arc<Mutex<VizLogger>>);

impl SharedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, VizLogger> {
        // 毒化时照样取出数据
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<VizEvent> {
        self.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FabricObserver for SharedLog {
    fn on_event(&mut self, ev: &VizEvent) {
        self.lock().push(ev.clone());
    }
}
