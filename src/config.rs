//! 仿真全局配置
//!
//! 每条 cable 的传播时延 = `BASE_DELAY × delay_factor × rtt_factor`。
//! 配置是不可变值，通过 `Fabric::new` 传入，不存在进程级全局状态。

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::SimTime;

/// 单条链路的基础时延（50 ms，固定）。
pub const BASE_DELAY: SimTime = SimTime::from_millis(50);

pub const MIN_DELAY_FACTOR: u32 = 1;
pub const MAX_DELAY_FACTOR: u32 = 100;
pub const MIN_RTT_FACTOR: u32 = 1;
pub const MAX_RTT_FACTOR: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig", into = "RawConfig")]
pub struct SimConfig {
    delay_factor: u32,
    rtt_factor: u32,
}

impl SimConfig {
    pub fn new(delay_factor: u32, rtt_factor: u32) -> Result<Self> {
        if !(MIN_DELAY_FACTOR..=MAX_DELAY_FACTOR).contains(&delay_factor) {
            return Err(Error::InvalidConfig(format!(
                "delay factor {delay_factor} outside {MIN_DELAY_FACTOR}..={MAX_DELAY_FACTOR}"
            )));
        }
        if !(MIN_RTT_FACTOR..=MAX_RTT_FACTOR).contains(&rtt_factor) {
            return Err(Error::InvalidConfig(format!(
                "rtt factor {rtt_factor} outside {MIN_RTT_FACTOR}..={MAX_RTT_FACTOR}"
            )));
        }
        Ok(Self {
            delay_factor,
            rtt_factor,
        })
    }

    pub fn delay_factor(&self) -> u32 {
        self.delay_factor
    }

    pub fn rtt_factor(&self) -> u32 {
        self.rtt_factor
    }

    /// 返回修改了 delay factor 的新配置。
    pub fn with_delay_factor(self, delay_factor: u32) -> Result<Self> {
        Self::new(delay_factor, self.rtt_factor)
    }

    /// 返回修改了 RTT factor 的新配置。
    pub fn with_rtt_factor(self, rtt_factor: u32) -> Result<Self> {
        Self::new(self.delay_factor, rtt_factor)
    }

    /// 一帧在 cable 上的传播时延。
    pub fn link_delay(&self) -> SimTime {
        BASE_DELAY
            .scaled(self.delay_factor as u64)
            .scaled(self.rtt_factor as u64)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            delay_factor: MIN_DELAY_FACTOR,
            rtt_factor: MIN_RTT_FACTOR,
        }
    }
}

/// 反序列化用的未校验形式；缺省字段取 1。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default = "one")]
    delay_factor: u32,
    #[serde(default = "one")]
    rtt_factor: u32,
}

fn one() -> u32 {
    1
}

impl TryFrom<RawConfig> for SimConfig {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        SimConfig::new(raw.delay_factor, raw.rtt_factor)
    }
}

impl From<SimConfig> for RawConfig {
    fn from(cfg: SimConfig) -> Self {
        RawConfig {
            delay_factor: cfg.delay_factor,
            rtt_factor: cfg.rtt_factor,
        }
    }
}
