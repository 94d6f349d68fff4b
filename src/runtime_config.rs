//! Environment variable based runtime configuration.
//!
//! Two knobs affect the transport:
//!
//! - `RAFALE_STACK_SIZE` sets the coroutine stack size in bytes, as a
//!   decimal (`16384`) or hex (`0x4000`) value. Default: `0x4000` (16 KB).
//!   Total memory scales with stack_size times concurrent connections, so
//!   keep it as small as your handlers allow.
//! - `RAFALE_READ_BUF` sets the per-connection read buffer size in bytes.
//!   Default: `4096`.
//!
//! Unset or unparsable values fall back to the defaults.

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;
const DEFAULT_READ_BUF_SIZE: usize = 4096;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup with [`RuntimeConfig::from_env()`], or construct it
/// directly to configure a server programmatically.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for connection coroutines, in bytes.
    pub stack_size: usize,
    /// Size of the per-connection read buffer, in bytes.
    pub read_buf_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
            read_buf_size: DEFAULT_READ_BUF_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        RuntimeConfig {
            stack_size: env_size("RAFALE_STACK_SIZE", DEFAULT_STACK_SIZE),
            read_buf_size: env_size("RAFALE_READ_BUF", DEFAULT_READ_BUF_SIZE),
        }
    }
}

fn env_size(name: &str, default: usize) -> usize {
    match env::var(name) {
        Ok(val) => parse_size(&val).unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a size value as decimal or `0x`-prefixed hex.
fn parse_size(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
