//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, I/O is handled by caller

use thiserror::Error;
use tracing::info;

use super::{Cli, Commands, CreateArgs, DeleteArgs, OutputFormat, QueryArgs};
use crate::client::{CloudManagerClient, FleetApi, TransportError};
use crate::cluster::{build_cluster_request, ClusterIntent, SpecError, TierIntent};
use crate::config::{self, ConfigError, Settings};
use crate::orchestrator::{self, AccessInfo, NodePicker, OrchestrationError, RandomPicker};
use crate::probe::{MySqlProbe, SqlProbe};

use super::display::{format_access_info, format_cluster_detail, format_cluster_list};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Settings (pure business logic)
// ============================================================================

/// Apply command-line overrides on top of file settings
pub fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(addr) = &cli.cloud_manager_addr {
        settings.cloud_manager_addr = Some(addr.clone());
    }
    if let Commands::Create(args) = &cli.command {
        if args.cleanup_on_timeout {
            settings.cleanup_on_timeout = true;
        }
    }
    settings
}

/// Load the config file named on the command line (or the default one) and
/// apply overrides. Fails when no cloud manager address is known.
pub fn resolve_settings(cli: &Cli) -> CommandResult<Settings> {
    let settings = match &cli.config {
        Some(path) => config::load_settings_from(path)?,
        None => config::load_settings()?,
    };
    let settings = apply_overrides(settings, cli);
    settings.clusters_url()?;
    Ok(settings)
}

/// Translate create flags into a cluster intent
pub fn cluster_intent(args: &CreateArgs) -> ClusterIntent {
    ClusterIntent {
        name: args.name.clone().unwrap_or_default(),
        placement_driver: TierIntent::new(args.pd_version.clone().unwrap_or_default(), args.pd_count),
        storage: TierIntent::new(args.tikv_version.clone().unwrap_or_default(), args.tikv_count),
        gateway: TierIntent::new(args.tidb_version.clone().unwrap_or_default(), args.tidb_count),
        monitor: args.with_monitor,
        affinity_label: args.label.clone().filter(|l| !l.is_empty()),
    }
}

fn required_name(name: Option<&str>) -> CommandResult<&str> {
    name.filter(|n| !n.is_empty())
        .ok_or(CommandError::Spec(SpecError::Missing("cluster name")))
}

// ============================================================================
// Commands
// ============================================================================

/// Create a cluster and wait until it is reachable
pub async fn create(
    api: &dyn FleetApi,
    probe: &dyn SqlProbe,
    picker: &mut dyn NodePicker,
    settings: &Settings,
    args: &CreateArgs,
) -> CommandResult<AccessInfo> {
    let request = build_cluster_request(&cluster_intent(args), &settings.spec)?;
    info!("creating cluster {}", request.name);
    Ok(orchestrator::provision(api, probe, picker, settings, &request).await?)
}

/// Fetch clusters and render them in the requested format
pub async fn query(api: &dyn FleetApi, args: &QueryArgs) -> CommandResult<String> {
    let name = args.name.as_deref().filter(|n| !n.is_empty());
    let clusters = api.list_clusters(name).await?;

    let output = match args.output {
        OutputFormat::Table => format_cluster_list(&clusters),
        OutputFormat::Detail => clusters.iter().map(format_cluster_detail).collect(),
        OutputFormat::Json => serde_json::to_string_pretty(&clusters)? + "\n",
    };
    Ok(output)
}

/// Delete a cluster, returning its name
pub async fn delete(api: &dyn FleetApi, args: &DeleteArgs) -> CommandResult<String> {
    let name = required_name(args.name.as_deref())?;
    info!("delete cluster {}", name);
    api.delete_cluster(name).await?;
    Ok(name.to_string())
}

// ============================================================================
// I/O boundary: wire real clients to the commands
// ============================================================================

/// Run the parsed command line and return what should be printed
pub async fn run(cli: &Cli) -> CommandResult<String> {
    let settings = resolve_settings(cli)?;
    let api = CloudManagerClient::new(settings.clusters_url()?);

    match &cli.command {
        Commands::Create(args) => {
            let probe = MySqlProbe::new(&settings.probe);
            let mut picker = RandomPicker::new();
            let access = create(&api, &probe, &mut picker, &settings, args).await?;
            Ok(format_access_info(&access))
        }
        Commands::Query(args) => query(&api, args).await,
        Commands::Delete(args) => {
            let name = delete(&api, args).await?;
            Ok(format!(
                "delete cluster {} at {}\n",
                name,
                api.cluster_url(&name)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::cloud_manager::mock::MockFleetApi;
    use crate::cluster::Cluster;
    use crate::orchestrator::prober::mock::MockProbe;
    use crate::orchestrator::SequencePicker;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_args(name: &str) -> CreateArgs {
        CreateArgs {
            name: Some(name.to_string()),
            pd_version: Some("v1".to_string()),
            tikv_version: Some("v1".to_string()),
            tidb_version: Some("v1".to_string()),
            pd_count: 1,
            tikv_count: 3,
            tidb_count: 2,
            label: None,
            with_monitor: false,
            cleanup_on_timeout: false,
        }
    }

    #[test]
    fn test_cluster_intent_from_args() {
        let mut args = create_args("demo");
        args.label = Some(String::new());
        let intent = cluster_intent(&args);
        assert_eq!(intent.name, "demo");
        assert_eq!(intent.storage, TierIntent::new("v1", 3));
        assert_eq!(intent.affinity_label, None);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"cloud_manager_addr: http://file:1\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from([
            "cmctl",
            "--config",
            path.as_str(),
            "--cloud-manager-addr",
            "http://flag:2",
            "create",
            "--cleanup-on-timeout",
        ]);
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.cloud_manager_addr.as_deref(), Some("http://flag:2"));
        assert!(settings.cleanup_on_timeout);
    }

    #[test]
    fn test_missing_addr_is_config_error() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let mut cli = Cli::parse_from(["cmctl", "--config", path.as_str(), "query"]);
        cli.cloud_manager_addr = None;

        let result = resolve_settings(&cli);
        assert!(matches!(
            result,
            Err(CommandError::Config(ConfigError::MissingCloudManagerAddr))
        ));
    }

    #[tokio::test]
    async fn test_create_missing_version_makes_no_calls() {
        let api = MockFleetApi::new(vec![]);
        let probe = MockProbe::healthy(&[]);
        let mut picker = SequencePicker::new(vec![0]);
        let mut args = create_args("demo");
        args.tikv_version = None;

        let result = create(&api, &probe, &mut picker, &Settings::default(), &args).await;
        match result {
            Err(e) => assert_eq!(e.to_string(), "lack of tikv version"),
            Ok(_) => panic!("Expected config error"),
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_requires_name() {
        let api = MockFleetApi::new(vec![]);
        let result = delete(&api, &DeleteArgs { name: None }).await;
        assert!(matches!(result, Err(CommandError::Spec(_))));
        assert!(api.calls().is_empty());

        let name = delete(&api, &DeleteArgs { name: Some("demo".to_string()) })
            .await
            .unwrap();
        assert_eq!(name, "demo");
        assert_eq!(api.calls(), vec!["delete demo"]);
    }

    #[tokio::test]
    async fn test_query_formats() {
        let cluster = Cluster {
            name: "demo".to_string(),
            ..Default::default()
        };
        let api = MockFleetApi::new(vec![vec![cluster]]);

        let table = query(
            &api,
            &QueryArgs {
                name: None,
                output: OutputFormat::Table,
            },
        )
        .await
        .unwrap();
        assert!(table.contains("demo"));

        let json = query(
            &api,
            &QueryArgs {
                name: Some("demo".to_string()),
                output: OutputFormat::Json,
            },
        )
        .await
        .unwrap();
        assert!(json.contains("\"name\": \"demo\""));
        assert_eq!(api.calls(), vec!["get *", "get demo"]);
    }
}
