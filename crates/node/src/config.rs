// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Node configuration, as read from a TOML file

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use votechain::{Address, Clock, LedgerConfig, Timestamp};
use votechain_types::{
    ledger_config_file::LedgerConfigFile,
    traits::clock::{ManualClock, SystemClock},
};

/// Where ledger time comes from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockConfig {
    /// The host's wall clock
    #[default]
    System,
    /// A clock stopped at `timestamp`; scripts move time through block timestamps
    Fixed {
        /// Seconds since the Unix epoch
        timestamp: Timestamp,
    },
}

impl ClockConfig {
    /// Build the configured clock
    #[must_use]
    pub fn build(&self) -> Arc<dyn Clock> {
        match self {
            Self::System => Arc::new(SystemClock),
            Self::Fixed { timestamp } => Arc::new(ManualClock::new(*timestamp)),
        }
    }
}

/// Where the ledger snapshot is kept
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file; without one the ledger lives in memory for a single invocation
    pub path: Option<PathBuf>,
}

/// Who administers the voting system, and where it lives
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// The administrator; deploys the components and signs script steps without a sender
    pub owner: Address,
    /// The results aggregator of an existing deployment. When absent the ledger is searched for
    /// its only aggregator.
    #[serde(default)]
    pub results: Option<Address>,
}

/// Holds configuration for a node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Ledger tuning
    #[serde(default)]
    pub ledger: LedgerConfigFile,
    /// Time source
    #[serde(default)]
    pub clock: ClockConfig,
    /// Persistence
    #[serde(default)]
    pub storage: StorageConfig,
    /// Administration
    pub deployment: DeploymentConfig,
}

impl NodeConfig {
    /// Read a configuration file
    ///
    /// # Errors
    /// If the file cannot be read or is not a valid configuration
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file located at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// The runtime ledger configuration
    #[must_use]
    pub fn ledger_config(&self) -> LedgerConfig {
        self.ledger.clone().into()
    }
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use super::*;

    #[test]
    fn full_config_parses() {
        let config: NodeConfig = toml::from_str(
            r#"
            [ledger]
            event_channel_size = 64
            event_history_limit = 0

            [clock]
            mode = "fixed"
            timestamp = 1700000000

            [storage]
            path = "ledger.bin"

            [deployment]
            owner = "0x00000000000000000000000000000000000000ad"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.clock,
            ClockConfig::Fixed {
                timestamp: 1_700_000_000
            }
        );
        assert_eq!(config.storage.path, Some(PathBuf::from("ledger.bin")));
        assert_eq!(config.deployment.owner, Address::from_low_u64_be(0xad));
        assert_eq!(config.deployment.results, None);
        let ledger = config.ledger_config();
        assert_eq!(ledger.event_channel_size, NonZeroUsize::new(64).unwrap());
        assert_eq!(ledger.event_history_limit, None);
        assert_eq!(config.clock.build().now(), 1_700_000_000);
    }

    #[test]
    fn only_the_owner_is_required() {
        let config: NodeConfig = toml::from_str(
            r#"
            [deployment]
            owner = "0x00000000000000000000000000000000000000ad"
            "#,
        )
        .unwrap();
        assert_eq!(config.clock, ClockConfig::System);
        assert_eq!(config.storage.path, None);
        assert_eq!(config.ledger, LedgerConfigFile::default());

        assert!(toml::from_str::<NodeConfig>("[clock]\nmode = \"fixed\"\n").is_err());
    }

    #[test]
    fn sample_config_parses() {
        let config: NodeConfig = toml::from_str(include_str!("../config/votechain.toml")).unwrap();
        assert!(matches!(config.clock, ClockConfig::Fixed { .. }));
        assert!(config.storage.path.is_some());
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read config file"));
    }
}
