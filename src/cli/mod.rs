//! CLI module for cmctl
//!
//! Subcommands against the cloud manager:
//! - `cmctl create` - Create a cluster and wait until its tidb answers queries
//! - `cmctl query` - List clusters, or show one
//! - `cmctl delete` - Delete a cluster

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "cmctl")]
#[command(about = "Create, query and delete database clusters through a cloud manager")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.cmctl/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a .env file to load before reading the environment
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// The address of the cloud manager
    #[arg(long, env = "CLOUD_MANAGER_ADDR", global = true)]
    pub cloud_manager_addr: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a cluster and wait until it serves traffic
    Create(CreateArgs),

    /// List clusters, or fetch one by name
    Query(QueryArgs),

    /// Delete a cluster
    Delete(DeleteArgs),
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Cluster name
    #[arg(long)]
    pub name: Option<String>,

    /// pd image version
    #[arg(long)]
    pub pd_version: Option<String>,

    /// tikv image version
    #[arg(long)]
    pub tikv_version: Option<String>,

    /// tidb image version
    #[arg(long)]
    pub tidb_version: Option<String>,

    /// pd pod count
    #[arg(long, default_value_t = 1)]
    pub pd_count: i32,

    /// tikv pod count
    #[arg(long, default_value_t = 5)]
    pub tikv_count: i32,

    /// tidb pod count
    #[arg(long, default_value_t = 1)]
    pub tidb_count: i32,

    /// Label for node selector
    #[arg(long)]
    pub label: Option<String>,

    /// Also deploy the monitoring tier
    #[arg(long)]
    pub with_monitor: bool,

    /// Delete the cluster if it never becomes reachable
    #[arg(long)]
    pub cleanup_on_timeout: bool,
}

/// Arguments for the query command
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Cluster name (omit to list all clusters)
    #[arg(long)]
    pub name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Cluster name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    #[value(alias = "wide")]
    Detail,
    Json,
}

/// Parse `args`, loading `--env-file` first when one is given.
///
/// The file is loaded before the final parse so env-backed flags such as
/// `CLOUD_MANAGER_ADDR` see its values. Variables already set win.
pub fn parse_with_env_file<I, T>(args: I) -> Result<Cli, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cli = Cli::parse_from(args.iter().cloned());

    let Some(path) = cli.env_file.clone() else {
        return Ok(cli);
    };
    dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
        path,
        message: e.to_string(),
    })?;
    Ok(Cli::parse_from(args))
}

/// Log filter for a `-v` count. `RUST_LOG` overrides it when set.
pub fn log_filter(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
