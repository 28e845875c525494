//! `resultwire-core` — domain foundation building blocks.
//!
//! This crate contains the **pure domain** types shared across the workspace
//! (build identity, server configuration); no infrastructure concerns.

pub mod build;
pub mod config;

pub use build::{BuildHandle, BuildOrigin, BuildRef};
pub use config::{ServerConfig, ServerIdentity};
