//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Dual-path login: remote verification with a cached-credential fallback
//! - Session token persistence and lazy expiry checks
//! - Online/offline mode tracking
//! - Bearer header construction for authenticated calls

pub mod models;
pub mod password;
pub mod service;

#[cfg(test)]
mod tests;

pub use models::{LoginMode, LoginSuccess, OfflineTokenPayload};
pub use service::AuthService;
