mod config;
mod fabric;
mod node;
mod simulator;

use crate::net::{FabricWorld, Frame, MacAddr, PortId};
use crate::sim::Simulator;

/// 发一帧并返回其 id
fn send_frame(
    world: &mut FabricWorld,
    sim: &mut Simulator,
    port: PortId,
    src: MacAddr,
    dst: MacAddr,
) -> u64 {
    let frame: Frame = world.fabric.make_frame(src, dst, vec![0u8; 16]);
    let id = frame.id();
    world.fabric.send(port, frame, sim).expect("send");
    id
}

/// 端口输入队列里所有帧的 id
fn input_ids(world: &FabricWorld, port: PortId) -> Vec<u64> {
    world
        .fabric
        .port(port)
        .expect("port")
        .input()
        .iter()
        .map(Frame::id)
        .collect()
}
