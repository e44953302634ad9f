pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod navigation;
pub mod views;

pub use error::{Error, Result};

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether request/response bodies are logged, shared between the logger filter and the config toggle.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}
