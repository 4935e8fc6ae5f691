//! CLI for gatelink
//!
//! Subcommands:
//! - `gatelink synth <topology>` - synthesize reverse-proxy routes/clusters
//! - `gatelink validate <topology>` - check a topology file
//! - `gatelink run <topology>` - register the topology, run the endpoint
//!   watcher, and print the enriched snapshots

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tokio::time::{sleep, Instant};
use tracing::info;

use crate::notify::ResourceNotifier;
use crate::proxy::{synthesize, ProxyBackend};
use crate::topology::{load_topology_file, ResourceState, Topology};
use crate::watcher::WatcherLifecycle;

#[derive(Parser, Debug)]
#[command(name = "gatelink")]
#[command(about = "Reverse-proxy wiring and endpoint URL enrichment for service topologies")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize reverse-proxy configuration from a topology file
    Synth(SynthArgs),

    /// Validate a topology file
    Validate(ValidateArgs),

    /// Run the topology with the endpoint watcher
    Run(RunArgs),
}

/// Arguments for the synth command
#[derive(Parser, Debug)]
pub struct SynthArgs {
    /// Path to the topology file (JSON or YAML)
    #[arg(required = true)]
    pub topology_file: PathBuf,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the topology file (JSON or YAML)
    #[arg(required = true)]
    pub topology_file: PathBuf,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the topology file (JSON or YAML)
    #[arg(required = true)]
    pub topology_file: PathBuf,

    /// How long to wait for URL enrichment before giving up (milliseconds)
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub settle_ms: u64,
}

fn load(path: &PathBuf) -> anyhow::Result<Topology> {
    load_topology_file(path)
        .with_context(|| format!("Failed to load topology file {}", path.display()))
}

fn build_backends(topology: &Topology) -> anyhow::Result<Vec<ProxyBackend>> {
    topology
        .backends
        .iter()
        .map(|spec| {
            ProxyBackend::new(&spec.client_name, &spec.path)
                .with_context(|| format!("Invalid backend for path '{}'", spec.path))
        })
        .collect()
}

/// Synthesize and print the routing table
pub fn synth_command(args: &SynthArgs) -> anyhow::Result<()> {
    let topology = load(&args.topology_file)?;
    let backends = build_backends(&topology)?;
    let routing = synthesize(&backends);

    let output = if args.compact {
        serde_json::to_string(&routing)?
    } else {
        serde_json::to_string_pretty(&routing)?
    };
    println!("{}", output);
    Ok(())
}

/// Validate the topology and report what it declares
pub fn validate_command(args: &ValidateArgs) -> anyhow::Result<()> {
    let topology = load(&args.topology_file)?;
    let resources = topology.build_resources()?;
    let backends = build_backends(&topology)?;

    println!(
        "Topology OK: {} resource(s), {} backend(s)",
        resources.len(),
        backends.len()
    );
    for resource in &resources {
        let annotated = resource.proxy_endpoints().len();
        if annotated > 0 {
            println!("  {} ({} proxy endpoint(s))", resource.name(), annotated);
        } else {
            println!("  {}", resource.name());
        }
    }
    Ok(())
}

/// Register the topology, run the watcher, and print the enriched snapshots
pub async fn run_command(args: &RunArgs) -> anyhow::Result<()> {
    let topology = load(&args.topology_file)?;
    let resources = topology.build_resources()?;

    // Endpoint names each annotated resource is expected to publish.
    let expected: Vec<(String, Vec<String>)> = resources
        .iter()
        .map(|r| {
            (
                r.name().to_string(),
                r.proxy_endpoints()
                    .iter()
                    .map(|e| e.name().to_string())
                    .collect(),
            )
        })
        .collect();

    let notifier = Arc::new(ResourceNotifier::new());
    for resource in resources {
        let name = resource.name().to_string();
        notifier
            .register(resource)
            .with_context(|| format!("Failed to register resource '{}'", name))?;
    }

    let mut lifecycle = WatcherLifecycle::new();
    lifecycle.start(notifier.clone());

    // Stand-in for the orchestrator: walk every resource to running.
    for (name, _) in &expected {
        notifier.set_state(name, ResourceState::Starting)?;
        notifier.set_state(name, ResourceState::Running)?;
        info!("Resource '{}' is running", name);
    }

    if !wait_for_enrichment(&notifier, &expected, Duration::from_millis(args.settle_ms)).await {
        tracing::warn!("Timed out waiting for URL enrichment");
    }

    for (name, _) in &expected {
        let snapshot = notifier
            .snapshot(name)
            .with_context(|| format!("Resource '{}' disappeared", name))?;
        let state = serde_json::to_string(&snapshot.state)?;
        println!("{:<16} {}", name, state.trim_matches('"'));
        for url in &snapshot.urls {
            println!("  {:<14} {}", url.name, url.url);
        }
    }

    lifecycle.stop().await;
    Ok(())
}

/// Wait until every annotated resource has published all its URLs
async fn wait_for_enrichment(
    notifier: &ResourceNotifier,
    expected: &[(String, Vec<String>)],
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let settled = expected
            .iter()
            .all(|(name, endpoint_names)| match notifier.snapshot(name) {
                Some(snapshot) => endpoint_names.iter().all(|expected_name| {
                    snapshot
                        .urls
                        .iter()
                        .any(|url| url.name.eq_ignore_ascii_case(expected_name))
                }),
                None => false,
            });
        if settled {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(20)).await;
    }
}
