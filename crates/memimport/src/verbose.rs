//! Verbosity-gated diagnostics written to stderr.
//!
//! Level 0 is silent, 1 reports load events, 2 and above adds
//! resolution-internal detail. The initial level comes from the
//! `MEMIMPORT_VERBOSE` environment variable.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI32, Ordering};

// -1 means "not set through the API, fall back to the env default".
static VERBOSE: AtomicI32 = AtomicI32::new(-1);

fn env_default() -> i32 {
    static DEFAULT: OnceLock<i32> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        std::env::var("MEMIMPORT_VERBOSE")
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok())
            .unwrap_or(0)
            .max(0)
    })
}

/// Current diagnostic verbosity level.
pub fn verbosity() -> i32 {
    let level = VERBOSE.load(Ordering::Relaxed);
    if level >= 0 { level } else { env_default() }
}

/// Set the diagnostic verbosity level. Negative levels clamp to 0.
pub fn set_verbose(level: i32) {
    VERBOSE.store(level.max(0), Ordering::Relaxed);
}

/// Emit a diagnostic message when the current verbosity is at least
/// `level`.
#[macro_export]
macro_rules! verbose {
    ($level:expr, $($arg:tt)*) => {
        if $crate::verbosity() >= $level {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_verbose_clamps_negative_levels() {
        set_verbose(-5);
        assert_eq!(verbosity(), 0);
        set_verbose(2);
        assert_eq!(verbosity(), 2);
        set_verbose(0);
    }
}
