/// Monitoring engine module - dynamic per-target scheduling and polling
///
/// This module is responsible for:
/// - Reconciling running poll tasks against the stored target set
/// - Running one independent poll task per target at its own cadence
/// - Executing HTTP health checks and classifying outcomes
/// - Handing results to the database and the live fan-out layer
pub mod engine;
pub mod poller;
pub mod prober;
pub mod scheduler;
pub mod types;

pub use engine::{EngineSettings, MonitorEngine};
pub use prober::Prober;
pub use scheduler::Scheduler;
pub use types::LiveUpdate;
