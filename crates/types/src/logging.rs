// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Helper functions for logging

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// A `Once` instance to ensure that logging is only initialized once.
static LOGGING_INITIALIZED: Once = Once::new();

/// Helper function to setup logging for upstream crates.
///
/// Filtering follows `RUST_LOG`; setting `RUST_LOG_FORMAT=json` switches to structured output.
pub fn setup_logging() {
    LOGGING_INITIALIZED.call_once(|| {
        // Initialize tracing
        if std::env::var("RUST_LOG_FORMAT") == Ok("json".to_string()) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .json()
                .try_init();
        } else {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .try_init();
        }
    });
}
