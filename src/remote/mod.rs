//! # Remote Module
//!
//! The reqwest client for the authoritative server: credential
//! verification, best-effort logout, profile refresh, roster pull and the
//! health probe. Every call is bounded by the configured timeout so a
//! stalled server can never block the offline fallback or a local logout.

pub mod client;
pub mod models;

pub use client::RosterApi;
pub use models::{LoginResponse, RemoteUser};
