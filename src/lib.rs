//! pulse-service - dynamic endpoint monitoring engine
//!
//! Keeps a pool of independently-timed poll tasks in sync with a mutable
//! target list, probes each target at its own cadence, records every outcome,
//! and fans results out to live subscribers.

pub mod config;
pub mod database;
pub mod live;
pub mod monitoring;
pub mod pool;
pub mod validation;
