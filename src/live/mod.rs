/// Live fan-out layer
///
/// Distributes poll results to connected observers in real time, scoped by
/// target id. Purely in-memory; subscribers re-subscribe after a restart.

pub mod registry;

pub use registry::BroadcastRegistry;
