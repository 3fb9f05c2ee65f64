#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the pet map toolchain.
//!
//! `pet_map count` ingests facility sources and writes per-district count
//! reports; `pet_map cluster` additionally groups districts into facility
//! profiles; `pet_map check-config` prints the effective configuration.
//!
//! Uses `indicatif-log-bridge` (via [`pet_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pet_map_analytics_models::{ClusteringConfig, ClusteringStrategy};

use crate::config::PipelineConfig;

#[derive(Parser)]
#[command(name = "pet_map", about = "Pet-facility district map toolchain")]
struct Cli {
    /// Pipeline config TOML (defaults to the embedded Busan config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory reports are written to (overrides the config)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count facilities per district and write the count reports
    Count,
    /// Count facilities, then cluster districts by facility profile
    Cluster {
        /// Clustering strategy (`k_means` or `rule_based`)
        #[arg(long)]
        strategy: Option<ClusteringStrategy>,

        /// Number of k-means clusters
        #[arg(long)]
        k: Option<usize>,

        /// Base seed for k-means initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Choose k by silhouette score over 2..=MAX_K
        #[arg(long, value_name = "MAX_K")]
        explore: Option<usize>,
    },
    /// Parse the config and print the effective settings
    CheckConfig,
}

fn clustering_overrides(
    base: &ClusteringConfig,
    strategy: Option<ClusteringStrategy>,
    k: Option<usize>,
    seed: Option<u64>,
    explore: Option<usize>,
) -> ClusteringConfig {
    ClusteringConfig {
        strategy: strategy.unwrap_or(base.strategy),
        k: k.unwrap_or(base.k),
        seed: seed.unwrap_or(base.seed),
        explore_max_k: explore.or(base.explore_max_k),
        ..base.clone()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pet_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config: PipelineConfig = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Count => {
            let run = pipeline::count(&config, &multi)?;
            println!(
                "Counted {} facilities across {} districts ({} outside every district)",
                run.aggregation.totals().total(),
                run.aggregation.districts.len(),
                run.aggregation.unassigned.total()
            );
        }
        Commands::Cluster {
            strategy,
            k,
            seed,
            explore,
        } => {
            let clustering = clustering_overrides(&config.clustering, strategy, k, seed, explore);
            let result = pipeline::cluster(&config, &clustering, &multi)?;
            println!(
                "Clustered {} districts into {} clusters",
                result.assignments.len(),
                result.k
            );
            for summary in &result.clusters {
                println!(
                    "  {} {:<30} {:>4} districts  {}",
                    summary.cluster_id, summary.type_label, summary.member_count, summary.color
                );
            }
        }
        Commands::CheckConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
