/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Subscribers for the `tracing` events emitted by this crate.
//!
//! The crate logs copy fallbacks and structural mutations at `debug` level. Run with
//! `RUST_LOG=densemat=debug` to see them.

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Install a global subscriber logging to `stdout` that respects the `RUST_LOG`
/// environment variable.
///
/// If the environment variable is not set, the "info" level is used. Does nothing if a
/// global subscriber is already installed.
pub fn init_subscriber() {
    let fmt_layer = fmt::layer().with_target(true);

    // An already-installed global subscriber wins.
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init();
}

/// Create a subscriber for tests.
///
/// The returned guard installs the subscriber for the current thread only, so that test
/// threads do not conflict.
pub fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .set_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector;

    #[test]
    fn test_subscriber_captures_copy_fallback() {
        let _guard = init_test_subscriber();
        let v = Vector::new_view(&vec![1i32, 2, 3], 0, None).unwrap();
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_init_subscriber_twice() {
        init_subscriber();
        init_subscriber();
    }
}
