//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Identity, room and message fixtures
//! - A mock room WebSocket server
//! - Custom assertion macros

pub mod fixtures;

// Re-export commonly used utilities
pub use fixtures::*;
pub use ws_server::*;
