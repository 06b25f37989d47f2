// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::path::Path;
use std::sync::Arc;

use crate::builder::SnapshotBuilder;
use crate::catalog::AgentCatalog;
use crate::config::Config;
use crate::constraint::Placement;
use crate::defaults::MetaAttributeDefaults;
use crate::error::Result;
use crate::resource::{ResourceInstance, ResourceKind};
use crate::snapshot::{ClusterSnapshot, SharedSnapshot};
use crate::status::StatusReport;
use crate::version::VersionContext;

/// Cluster is everything read for one cluster: the agent catalog, which is built once, and the
/// latest configuration snapshot, which `refresh` replaces.
#[derive(Debug)]
pub struct Cluster {
    config: Config,
    version: VersionContext,
    catalog: AgentCatalog,
    snapshot: SharedSnapshot,
    status: Option<StatusReport>,
}

impl Cluster {
    /// Create a Cluster given a path to a config file. Problems are reported on stderr.
    pub fn from_config(path: String) -> std::result::Result<Self, crate::commands::EmptyError> {
        let mut args = crate::commands::Cli::default();
        args.config = Some(path);
        Self::new(&args)
    }

    /// Create a Cluster from command line arguments, which hold the (optional) path to the config
    /// file.
    pub fn new(args: &crate::commands::Cli) -> std::result::Result<Self, crate::commands::EmptyError> {
        let path = match &args.config {
            Some(path) => path,
            None => &crate::default_config_path(),
        };
        let config = std::fs::read_to_string(path).inspect_err(|e| {
            eprintln!("Could not open config file \"{path}\": {e}");
        })?;

        let config = Config::parse(&config).inspect_err(|e| {
            eprintln!("Could not parse config file \"{path}\": {e}");
        })?;

        let config = config.relative_to(Path::new(path));
        let cib = config.cib.display().to_string();
        let cluster =
            Self::load(config).inspect_err(|e| eprintln!("Could not read CIB \"{cib}\": {e}"))?;
        Ok(cluster)
    }

    /// Build the catalog and the first snapshot. Only an unreadable CIB file is an error; agents
    /// and the status document that can't be read are logged and left out.
    pub fn load(config: Config) -> Result<Self> {
        let version = config.version();
        let mut catalog = AgentCatalog::new(&version, &MetaAttributeDefaults::default());

        for agent in &config.agents {
            let loaded = std::fs::read_to_string(&agent.metadata)
                .map_err(crate::Error::from)
                .and_then(|text| {
                    catalog.load_agent_metadata(
                        &agent.name,
                        agent.provider.as_deref(),
                        &agent.class,
                        &text,
                        agent.master_slave,
                    )
                });
            if let Err(e) = loaded {
                tracing::warn!(
                    "could not load metadata for {} from \"{}\": {e}",
                    agent.name,
                    agent.metadata.display()
                );
            }
        }
        for warning in catalog.startup_warnings() {
            tracing::info!("{warning}");
        }

        let status = config.status.as_ref().and_then(|path| {
            std::fs::read_to_string(path)
                .map_err(crate::Error::from)
                .and_then(|text| StatusReport::parse(&text))
                .inspect_err(|e| {
                    tracing::warn!("could not read status \"{}\": {e}", path.display())
                })
                .ok()
        });

        let cib = std::fs::read_to_string(&config.cib)?;
        let snapshot = SnapshotBuilder::new(&catalog, &version).build(&cib);

        Ok(Cluster {
            config,
            version,
            catalog,
            snapshot: SharedSnapshot::new(snapshot),
            status,
        })
    }

    /// Read the CIB again and publish a new snapshot.
    pub fn refresh(&self) -> Result<Arc<ClusterSnapshot>> {
        let cib = std::fs::read_to_string(&self.config.cib)?;
        let snapshot = SnapshotBuilder::new(&self.catalog, &self.version).build(&cib);
        self.snapshot.publish(snapshot);
        Ok(self.snapshot.load())
    }

    pub fn snapshot(&self) -> Arc<ClusterSnapshot> {
        self.snapshot.load()
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    pub fn version(&self) -> &VersionContext {
        &self.version
    }

    pub fn resource_status(&self) -> Option<&StatusReport> {
        self.status.as_ref()
    }

    /// Print out a summary of the cluster to stdout.
    pub fn print_summary(&self, constraints: bool) {
        let snapshot = self.snapshot();

        println!("=== Nodes ===");
        for node in snapshot.nodes() {
            let state = if snapshot.is_online(node) {
                "online"
            } else if snapshot.is_pending(node) {
                "pending"
            } else {
                "offline"
            };
            let mut flags = Vec::new();
            if snapshot.dc() == Some(node.as_str()) {
                flags.push("DC");
            }
            if snapshot.is_fenced(node) {
                flags.push("fenced");
            }
            println!("{node}: {state} {}", flags.join(" "));
        }

        println!();
        println!("=== Resources ===");
        for res in snapshot.top_level_resources() {
            print_resource(&snapshot, res, 0);
        }

        if constraints {
            println!();
            println!("=== Constraints ===");
            for c in snapshot.colocations() {
                println!(
                    "colocation {}: {} with {} ({})",
                    c.id,
                    c.rsc,
                    c.with_rsc,
                    c.score.as_deref().unwrap_or("-")
                );
            }
            for o in snapshot.orders() {
                println!(
                    "order {}: {} {} then {} {}",
                    o.id,
                    o.first_action.as_deref().unwrap_or("start"),
                    o.first,
                    o.then_action.as_deref().unwrap_or("start"),
                    o.then
                );
            }
            for l in snapshot.locations() {
                match &l.placement {
                    Placement::Host { node, score, .. } => println!(
                        "location {}: {} on {} ({})",
                        l.id,
                        l.rsc,
                        node,
                        score.as_deref().unwrap_or("-")
                    ),
                    Placement::Metric { attribute, .. } => {
                        println!("location {}: {} by {}", l.id, l.rsc, attribute)
                    }
                }
            }
            for group in snapshot.placeholders() {
                let ids: Vec<&str> = group.iter().map(|c| c.constraint_id()).collect();
                let first = group[0];
                let side = |s: Option<&crate::resource_set::ResourceSet>| {
                    s.map(|s| s.members().join(" ")).unwrap_or_default()
                };
                println!(
                    "sets [{}] -> [{}] ({})",
                    side(Some(first.set1())),
                    side(first.set2()),
                    ids.join(", ")
                );
            }
        }

        if !snapshot.warnings().is_empty() {
            println!();
            println!("=== Warnings ===");
            for warning in snapshot.warnings() {
                println!("{warning}");
            }
        }
    }
}

fn print_resource(snapshot: &ClusterSnapshot, res: &ResourceInstance, depth: usize) {
    let indent = "\t".repeat(depth);
    let orphan = if res.orphaned { " (orphaned)" } else { "" };
    println!(
        "{indent}{} [{}]{orphan} {}",
        res.id,
        res.type_string(),
        res.params_string()
    );
    let children: Vec<&str> = match &res.kind {
        ResourceKind::Group { members } => members.iter().map(String::as_str).collect(),
        ResourceKind::Clone { inner, .. } => inner.iter().map(String::as_str).collect(),
        ResourceKind::Primitive { .. } => Vec::new(),
    };
    for child in children.into_iter().filter_map(|id| snapshot.resource(id)) {
        print_resource(snapshot, child, depth + 1);
    }
}
