//! # Sync Module
//!
//! Decides when the cached roster is stale and refreshes it from the
//! server. Demand-driven: syncs run on explicit request or view
//! activation, never on an internal timer.

pub mod service;


pub use service::{sync_due, RosterRefresh, SyncService};
