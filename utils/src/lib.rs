//! Shared utilities for lvote.

pub mod logging;

pub use logging::{init_logging, LogFormat};
