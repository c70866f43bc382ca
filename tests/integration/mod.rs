//! Integration tests against mock history and channel servers

pub mod channel_test;
pub mod config_test;
pub mod history_test;
