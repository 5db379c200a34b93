//! 错误类型

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::net::{NodeId, PortId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// cable 无法建立；此时没有任何端口被绑定。
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },

    /// 静态表和动态表都没有匹配项。上层（IP）应当按“目的不可达”处理。
    #[error("no route to {0}")]
    NoRoute(Ipv4Addr),

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("unknown port {0:?}")]
    UnknownPort(PortId),

    #[error("node {0:?} has no network interfaces")]
    NotInterfaceNode(NodeId),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid scenario: {0}")]
    Scenario(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn connection(reason: impl Into<String>) -> Self {
        Error::ConnectionFailed {
            reason: reason.into(),
        }
    }
}
