//! 无界 FIFO 帧队列

use std::collections::VecDeque;

use crate::net::Frame;

#[derive(Debug, Default)]
pub struct FifoQueue {
    q: VecDeque<Frame>,
    bytes: u64,
    /// 累计入队帧数（不随出队减少）
    enqueued: u64,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.bytes = self.bytes.saturating_add(frame.len() as u64);
        self.enqueued = self.enqueued.saturating_add(1);
        self.q.push_back(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.q.pop_front()?;
        self.bytes = self.bytes.saturating_sub(frame.len() as u64);
        Some(frame)
    }

    pub fn peek(&self) -> Option<&Frame> {
        self.q.front()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn total_enqueued(&self) -> u64 {
        self.enqueued
    }

    pub fn clear(&mut self) {
        self.q.clear();
        self.bytes = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.q.iter()
    }
}
