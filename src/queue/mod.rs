//! 端口缓冲队列
//!
//! 每个端口持有一个输入队列和一个输出队列。队列无容量上限，本层不建模背压。

mod fifo;

pub use fifo::FifoQueue;
