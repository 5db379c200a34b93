//! Fabric event subscribers.

use crate::viz::VizEvent;

/// Receives every event the fabric publishes (link activity, learning,
/// spanning-tree results). Implemented by `VizLogger` and `SharedLog`; a GUI
/// would implement it to refresh its view.
pub trait FabricObserver: Send {
    fn on_event(&mut self, ev: &VizEvent);
}
