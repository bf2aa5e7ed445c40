// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Command line front end for the votechain ledger
//!
//! Deploys the voting system, applies JSON scripts of steps and prints election results. Every
//! command prints JSON on stdout, one document per line.

mod config;
mod script;

use std::{io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use votechain::{
    contracts::Contract,
    system::Deployment,
    traits::implementations::{FileStorage, MemoryStorage},
    types::ElectionId,
    Block, Ledger, Storage, VotingSystem,
};
use votechain_types::logging::setup_logging;

use crate::{config::NodeConfig, script::Script};

#[derive(Parser, Debug)]
#[command(name = "votechain-node", about = "Runs the votechain voting ledger")]
/// The command line arguments for the node
struct Args {
    /// The configuration file to be used for this run
    #[arg(short, long, env = "VOTECHAIN_CONFIG", default_value = "votechain.toml")]
    config: PathBuf,

    /// What to do
    #[command(subcommand)]
    command: Command,
}

/// The node's commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Deploy and wire the five components, administered by the configured owner
    Deploy,
    /// Apply every step of a JSON script, deploying first if the ledger has no deployment
    Run {
        /// The script to apply
        #[arg(long)]
        script: PathBuf,
    },
    /// Print the results of an election
    Results {
        /// The election
        #[arg(long)]
        election: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let args = Args::parse();
    let config = NodeConfig::load(&args.config)?;
    let mut stdout = std::io::stdout();

    match config.storage.path.clone() {
        Some(path) => {
            info!(path = %path.display(), "Using file storage");
            let ledger = open(&config, FileStorage::new(path)).await?;
            execute(&args.command, &config, &ledger, &mut stdout).await
        }
        None => {
            info!("Using in-memory storage");
            let ledger = open(&config, MemoryStorage::empty()).await?;
            execute(&args.command, &config, &ledger, &mut stdout).await
        }
    }
}

/// Open the ledger described by `config` on top of `storage`
async fn open<S: Storage>(config: &NodeConfig, storage: S) -> Result<Ledger<S>> {
    Ledger::new(config.ledger_config(), config.clock.build(), storage)
        .await
        .context("Failed to open ledger")
}

/// Run `command` against `ledger`, writing its output to `out`
async fn execute<S: Storage>(
    command: &Command,
    config: &NodeConfig,
    ledger: &Ledger<S>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Deploy => {
            let system = VotingSystem::deploy(ledger, config.deployment.owner)
                .await
                .context("Failed to deploy voting system")?;
            print_json(out, &system.deployment())
        }
        Command::Run { script } => {
            let contents = tokio::fs::read_to_string(script)
                .await
                .with_context(|| format!("Could not read script {}", script.display()))?;
            let script: Script = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid script {}", script.display()))?;
            let deployment = match find_deployment(config, ledger).await? {
                Some(deployment) => deployment,
                None => {
                    let system = VotingSystem::deploy(ledger, config.deployment.owner)
                        .await
                        .context("Failed to deploy voting system")?;
                    print_json(out, &system.deployment())?;
                    system.deployment()
                }
            };
            run_script(script, &deployment, config, ledger, out).await
        }
        Command::Results { election } => {
            let Some(deployment) = find_deployment(config, ledger).await? else {
                bail!("No deployment found; run `deploy` first");
            };
            let system = VotingSystem::attach(ledger, deployment).await?;
            let results = system
                .results
                .get_full_results(ElectionId::new(*election))
                .await?;
            print_json(out, &results)
        }
    }
}

/// Apply every step of `script`, printing one receipt per step
async fn run_script<S: Storage>(
    script: Script,
    deployment: &Deployment,
    config: &NodeConfig,
    ledger: &Ledger<S>,
    out: &mut impl Write,
) -> Result<()> {
    for (index, step) in script.steps.into_iter().enumerate() {
        let timestamp = match step.time {
            Some(time) => time,
            None => ledger.now().await,
        };
        let tx = step.transaction(deployment, config.deployment.owner);
        let receipts = ledger
            .apply_block(Block {
                timestamp,
                transactions: vec![tx],
            })
            .await
            .with_context(|| format!("Failed to apply step {index}"))?;
        for receipt in &receipts {
            print_json(out, receipt)?;
        }
    }
    Ok(())
}

/// The deployment named in `config`, or the only one on `ledger`
async fn find_deployment<S: Storage>(
    config: &NodeConfig,
    ledger: &Ledger<S>,
) -> Result<Option<Deployment>> {
    if let Some(results) = config.deployment.results {
        let system = VotingSystem::from_results(ledger, results)
            .await
            .with_context(|| format!("No deployment behind results aggregator {results:?}"))?;
        return Ok(Some(system.deployment()));
    }

    let aggregators: Vec<_> = ledger
        .read(|state| {
            state
                .contracts()
                .filter_map(|contract| match contract {
                    Contract::Results(results) => Some(results.address()),
                    _ => None,
                })
                .collect()
        })
        .await;
    match aggregators.as_slice() {
        [] => Ok(None),
        [results] => Ok(Some(
            VotingSystem::from_results(ledger, *results)
                .await?
                .deployment(),
        )),
        _ => bail!(
            "{} deployments found; set `deployment.results` to pick one",
            aggregators.len()
        ),
    }
}

/// Write `value` as one line of JSON
fn print_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("Failed to encode output")?;
    writeln!(out).context("Failed to write output")
}
