//! # Runtime Configuration Module
//!
//! Coroutine runtime settings for the `may` scheduler that drives
//! `may_minihttp`.
//!
//! ## Environment Variables
//!
//! ### `FSR_STACK_SIZE`
//!
//! Stack size for request coroutines. Accepts decimal (`32768`) or
//! hexadecimal (`0x8000`). Default: `0x8000` (32 KB).
//!
//! Total virtual memory is roughly `stack_size × concurrent requests`; too
//! small a stack overflows in deep handlers.
//!
//! ## Usage
//!
//! ```rust
//! use fsrouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;
use tracing::{info, warn};

/// Default coroutine stack size (32 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Parse a stack size written in decimal or `0x`-prefixed hexadecimal.
#[must_use]
pub fn parse_stack_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
    .filter(|size| *size > 0)
}

/// Coroutine runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("FSR_STACK_SIZE") {
            Ok(val) => parse_stack_size(&val).unwrap_or_else(|| {
                warn!(value = %val, "Invalid FSR_STACK_SIZE, using default");
                DEFAULT_STACK_SIZE
            }),
            Err(_) => DEFAULT_STACK_SIZE,
        };
        RuntimeConfig { stack_size }
    }

    /// Configure the global `may` scheduler.
    ///
    /// Takes effect for coroutines spawned afterwards, so call it before the
    /// server starts.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(
            stack_size = self.stack_size,
            stack_size_hex = %format!("{:#x}", self.stack_size),
            "Coroutine runtime configured"
        );
    }
}
