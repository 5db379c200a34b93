//! 织物事件记录（供 GUI 或测试订阅）
//!
//! 设计目标：
//! - **结构化**：用 JSON 事件而不是解析文本日志
//! - **解耦**：`Fabric` 只向订阅者发布事件，不依赖任何 GUI 工具包
//! - **可回放**：事件带逻辑时间戳，写成 JSON 数组即可离线回放

mod types;

pub use types::{
    SharedLog, VizCableInfo, VizDropReason, VizEvent, VizEventKind, VizLogger, VizNodeInfo,
};
