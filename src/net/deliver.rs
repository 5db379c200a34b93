//! 数据面：投递通道与端口消费者
//!
//! 原始模型里每条 cable 有两个投递线程、每个交换机端口有一个消费者线程，
//! 彼此通过带 wait/notify 的队列交接。这里把每个“线程”换成虚拟时钟上的
//! 一串事件，顺序和时延语义保持不变：
//!
//! - `WakeChannel`：通道被唤醒，取出一帧开始传播；
//! - `DeliverFrame`：传播时延结束，帧进入对端输入队列，通道继续取下一帧；
//! - `PortRx`：端口消费者从输入队列取出一帧交给所属节点。
//!
//! 每个事件都带着调度时的 epoch；cable 被拆除或一轮仿真结束后，残留事件
//! 执行时发现对象不在或 epoch 不符即静默退出。在途帧在拆线或新一轮开始时
//! 计入丢失，绝不会重复投递。

use tracing::{debug, trace};

use super::cable::Direction;
use super::fabric::Fabric;
use super::fabric_world::FabricWorld;
use super::frame::Frame;
use super::id::{CableId, PortId};
use crate::error::{Error, Result};
use crate::sim::{Event, Simulator, World};
use crate::viz::VizEventKind;

fn fabric_of(world: &mut dyn World) -> &mut Fabric {
    &mut world
        .as_any_mut()
        .downcast_mut::<FabricWorld>()
        .expect("world must be FabricWorld")
        .fabric
}

/// 事件：唤醒一个投递通道
#[derive(Debug)]
pub struct WakeChannel {
    pub cable: CableId,
    pub dir: Direction,
    pub epoch: u64,
}

impl Event for WakeChannel {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let WakeChannel { cable, dir, epoch } = *self;
        fabric_of(world).on_channel_wake(cable, dir, epoch, sim);
    }
}

/// 事件：在途帧到达对端
#[derive(Debug)]
pub struct DeliverFrame {
    pub cable: CableId,
    pub dir: Direction,
    pub epoch: u64,
    pub frame: Frame,
}

impl Event for DeliverFrame {
    #[tracing::instrument(skip(self, sim, world), fields(frame_id = self.frame.id(), cable = ?self.cable))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame {
            cable,
            dir,
            epoch,
            frame,
        } = *self;
        fabric_of(world).on_frame_arrival(cable, dir, epoch, frame, sim);
    }
}

/// 事件：端口消费者处理输入队列中的一帧
#[derive(Debug)]
pub struct PortRx {
    pub port: PortId,
    pub epoch: u64,
}

impl Event for PortRx {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let PortRx { port, epoch } = *self;
        fabric_of(world).on_port_rx(port, epoch, sim);
    }
}

impl Fabric {
    /// enqueueOutput：帧放进端口输出队列，并唤醒该方向的投递通道
    pub fn send(&mut self, port: PortId, frame: Frame, sim: &mut Simulator) -> Result<()> {
        if !self.ports.contains(port) {
            return Err(Error::UnknownPort(port));
        }
        self.push_output(port, frame, sim);
        Ok(())
    }

    /// enqueueInput：帧直接放进端口输入队列，并唤醒该端口的消费者
    pub fn enqueue_input(&mut self, port: PortId, frame: Frame, sim: &mut Simulator) -> Result<()> {
        self.now = sim.now();
        let p = self.ports.get_mut(port).ok_or(Error::UnknownPort(port))?;
        p.enqueue_input(frame);
        self.notify_consumer(port, sim);
        Ok(())
    }

    /// 上层协议栈从输入队列取帧
    pub fn dequeue_input(&mut self, port: PortId) -> Option<Frame> {
        let frame = self.ports.get_mut(port)?.dequeue_input()?;
        self.stats.consumed_frames += 1;
        Some(frame)
    }

    pub(crate) fn push_output(&mut self, port: PortId, frame: Frame, sim: &mut Simulator) -> bool {
        self.now = sim.now();
        let Some(p) = self.ports.get_mut(port) else {
            return false;
        };
        trace!(port = ?port, frame_id = frame.id(), "帧进入输出队列");
        p.enqueue_output(frame);
        let cable = p.cable();
        if let Some(cable) = cable {
            if let Some(dir) = self.cable(cable).and_then(|c| c.direction_from(port)) {
                self.wake(cable, dir, sim);
            }
        }
        true
    }

    /// 唤醒空闲通道；通道正忙或已有待执行的唤醒时什么也不做
    fn wake(&mut self, cable: CableId, dir: Direction, sim: &mut Simulator) {
        let epoch = self.epoch;
        let Some(c) = self.cable_mut(cable) else {
            return;
        };
        let ch = c.channel_mut(dir);
        if ch.active || ch.wake_pending {
            return;
        }
        ch.wake_pending = true;
        sim.schedule(sim.now(), WakeChannel { cable, dir, epoch });
    }

    /// 唤醒在事件之外（例如 `connect`）变为可运行的通道
    pub fn flush_wakes(&mut self, sim: &mut Simulator) {
        for (cable, dir) in std::mem::take(&mut self.pending_wakes) {
            self.wake(cable, dir, sim);
        }
    }

    pub(super) fn on_channel_wake(&mut self, cable: CableId, dir: Direction, epoch: u64, sim: &mut Simulator) {
        self.now = sim.now();
        if epoch != self.epoch {
            return;
        }
        let Some(c) = self.cable_mut(cable) else {
            trace!(cable = ?cable, "cable 已拆除，唤醒作废");
            return;
        };
        let ch = c.channel_mut(dir);
        ch.wake_pending = false;
        if ch.active {
            return;
        }
        self.start_next(cable, dir, sim);
    }

    /// 通道取下一帧：队列空则转入空闲，否则标记 active 并调度到达事件
    fn start_next(&mut self, cable: CableId, dir: Direction, sim: &mut Simulator) {
        let delay = self.cfg.link_delay();
        let epoch = self.epoch;
        let Some(c) = self.cables.get_mut(cable.0).and_then(Option::as_mut) else {
            return;
        };
        let ch = c.channel_mut(dir);
        let (from, to) = (ch.from, ch.to);
        let next = self.ports.get_mut(from).and_then(|p| p.dequeue_output());

        let Some(frame) = next else {
            let was_active = ch.active;
            ch.active = false;
            ch.in_flight = None;
            if was_active {
                trace!(cable = ?cable, "通道空闲");
                self.emit(VizEventKind::CableIdle {
                    cable: cable.0,
                    from_port: from.0,
                });
            }
            return;
        };

        ch.active = true;
        ch.in_flight = Some(frame.id());
        let arrive = sim.now().saturating_add(delay);
        debug!(cable = ?cable, frame_id = frame.id(), arrive = %arrive, "帧开始传播");
        self.emit(VizEventKind::CableActive {
            cable: cable.0,
            from_port: from.0,
            to_port: to.0,
            frame_id: frame.id(),
            arrive_ns: arrive.0,
        });
        sim.schedule(
            arrive,
            DeliverFrame {
                cable,
                dir,
                epoch,
                frame,
            },
        );
    }

    pub(super) fn on_frame_arrival(
        &mut self,
        cable: CableId,
        dir: Direction,
        epoch: u64,
        frame: Frame,
        sim: &mut Simulator,
    ) {
        self.now = sim.now();
        if epoch != self.epoch {
            return;
        }
        // 拆线时已计入丢失
        let Some(c) = self.cable_mut(cable) else {
            trace!(frame_id = frame.id(), "cable 已拆除，到达作废");
            return;
        };
        let ch = c.channel_mut(dir);
        ch.in_flight = None;
        ch.delivered += 1;
        let to = ch.to;

        let Some(port) = self.ports.get_mut(to) else {
            return;
        };
        let node = port.owner();
        let frame_id = frame.id();
        port.enqueue_input(frame);
        self.stats.delivered_frames += 1;
        self.emit(VizEventKind::FrameDelivered {
            port: to.0,
            node: node.0,
            frame_id,
        });
        self.notify_consumer(to, sim);

        self.start_next(cable, dir, sim);
    }

    /// 唤醒端口消费者（仅对有本层消费者的节点）
    pub(super) fn notify_consumer(&mut self, port: PortId, sim: &mut Simulator) {
        let consumes = self
            .owner_of(port)
            .and_then(|o| self.node(o))
            .is_some_and(|n| n.consumes_input());
        if consumes {
            sim.schedule(
                sim.now(),
                PortRx {
                    port,
                    epoch: self.epoch,
                },
            );
        }
    }

    pub(super) fn on_port_rx(&mut self, port: PortId, epoch: u64, sim: &mut Simulator) {
        self.now = sim.now();
        if epoch != self.epoch {
            return;
        }
        let Some(p) = self.ports.get_mut(port) else {
            return;
        };
        let owner = p.owner();
        let Some(frame) = p.dequeue_input() else {
            return;
        };
        let Some(mut node) = self.take_node(owner) else {
            return;
        };
        node.on_frame(port, frame, sim, self);
        self.put_node(node);
    }
}
