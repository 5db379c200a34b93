pub mod config;
pub mod error;
pub mod net;
pub mod queue;
pub mod sim;
pub mod stp;
pub mod topo;
pub mod viz;

pub use config::SimConfig;
pub use error::{Error, Result};

#[cfg(test)]
mod test;
