//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络织物。

use super::fabric::Fabric;
use crate::config::SimConfig;
use crate::sim::{Simulator, World};
use std::any::Any;

/// 一个默认的网络世界实现：持有 Fabric。
#[derive(Default)]
pub struct FabricWorld {
    pub fabric: Fabric,
}

impl FabricWorld {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            fabric: Fabric::new(cfg),
        }
    }
}

impl World for FabricWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    // 事件里新连上的 cable 若已有积压帧，在这里启动其通道
    fn on_tick(&mut self, sim: &mut Simulator) {
        if !self.fabric.pending_wakes.is_empty() {
            self.fabric.flush_wakes(sim);
        }
    }
}
