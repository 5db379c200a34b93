//! 流量注入事件
//!
//! 用于周期性地从某个端口发帧

use tracing::warn;

use crate::net::{FabricWorld, MacAddr, PortId};
use crate::sim::{Event, SimTime, Simulator, World};

#[derive(Debug, Clone)]
pub struct InjectFrames {
    pub port: PortId,
    pub src: MacAddr,
    pub dst: MacAddr,
    pub payload_bytes: usize,
    pub remaining: u64,
    pub gap: SimTime,
}

impl Event for InjectFrames {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let mut me = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<FabricWorld>()
            .expect("world must be FabricWorld");

        if me.remaining == 0 {
            return;
        }

        let frame = w
            .fabric
            .make_frame(me.src, me.dst, vec![0u8; me.payload_bytes]);
        if let Err(e) = w.fabric.send(me.port, frame, sim) {
            warn!(error = %e, "注入失败，停止该流");
            return;
        }

        me.remaining -= 1;
        if me.remaining > 0 {
            sim.schedule_in(me.gap, InjectFrames { ..me });
        }
    }
}
