// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use std::num::NonZeroUsize;

use crate::{
    constants::{EVENT_CHANNEL_SIZE, EVENT_HISTORY_LIMIT},
    LedgerConfig,
};

/// Default capacity of the live notification channel
fn default_event_channel_size() -> usize {
    EVENT_CHANNEL_SIZE
}

/// Default history limit
fn default_event_history_limit() -> usize {
    EVENT_HISTORY_LIMIT
}

/// Contains configuration values for a `Ledger`, as read from a config file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerConfigFile {
    /// Capacity of the live notification channel; zero is treated as one
    #[serde(default = "default_event_channel_size")]
    pub event_channel_size: usize,
    /// Number of committed notifications to retain, zero means unbounded
    #[serde(default = "default_event_history_limit")]
    pub event_history_limit: usize,
}

impl Default for LedgerConfigFile {
    fn default() -> Self {
        Self {
            event_channel_size: default_event_channel_size(),
            event_history_limit: default_event_history_limit(),
        }
    }
}

impl From<LedgerConfigFile> for LedgerConfig {
    fn from(val: LedgerConfigFile) -> Self {
        LedgerConfig {
            event_channel_size: NonZeroUsize::new(val.event_channel_size).unwrap_or(NonZeroUsize::MIN),
            event_history_limit: NonZeroUsize::new(val.event_history_limit),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_history_limit_means_unbounded() {
        let config: LedgerConfig = LedgerConfigFile {
            event_channel_size: 0,
            event_history_limit: 0,
        }
        .into();
        assert_eq!(config.event_channel_size.get(), 1);
        assert_eq!(config.event_history_limit, None);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let file: LedgerConfigFile = serde_json::from_str(r#"{ "event_history_limit": 10 }"#).unwrap();
        assert_eq!(file.event_channel_size, EVENT_CHANNEL_SIZE);
        assert_eq!(file.event_history_limit, 10);
    }
}
