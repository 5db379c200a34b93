//! 统计信息

/// 织物统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// 进入对端输入队列的帧
    pub delivered_frames: u64,
    /// cable 拆除时仍在途、因此丢失的帧
    pub lost_frames: u64,
    /// 在被阻断的交换机端口上丢弃的帧
    pub dropped_blocked: u64,
    /// 出端口等于入端口而被过滤的帧
    pub filtered: u64,
    pub flooded_frames: u64,
    pub unicast_frames: u64,
    /// 被上层通过 `dequeue_input` 取走的帧
    pub consumed_frames: u64,
}
