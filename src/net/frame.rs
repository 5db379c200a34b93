//! 帧类型
//!
//! 帧创建后不可变。泛洪时同一帧会被放进多个端口的输出队列，
//! 负载用 `Arc<[u8]>` 共享，clone 只增加引用计数。

use std::sync::Arc;

use super::mac::MacAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: u64,
    src: MacAddr,
    dst: MacAddr,
    payload: Arc<[u8]>,
}

impl Frame {
    pub fn new(id: u64, src: MacAddr, dst: MacAddr, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            src,
            dst,
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn src(&self) -> MacAddr {
        self.src
    }

    pub fn dst(&self) -> MacAddr {
        self.dst
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// 两个帧是否共享同一块负载（泛洪不复制负载）。
    pub fn shares_payload(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}
