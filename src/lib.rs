// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod agent;
pub mod builder;
pub mod catalog;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod constraint;
pub mod defaults;
pub mod error;
pub mod resource;
pub mod resource_set;
pub mod snapshot;
pub mod status;
pub mod test_env;
pub mod version;
pub mod xml;

pub use crate::builder::SnapshotBuilder;
pub use crate::catalog::AgentCatalog;
pub use crate::cluster::Cluster;
pub use crate::defaults::MetaAttributeDefaults;
pub use crate::error::{Error, Result};
pub use crate::snapshot::{ClusterSnapshot, SharedSnapshot};
pub use crate::version::VersionContext;

use tracing_subscriber::EnvFilter;

pub fn default_config_path() -> String {
    match std::env::var("CRMCONF_CONFIG") {
        Ok(conf) => conf,
        Err(_) => "/etc/crmconf/crmconf.conf".to_string(),
    }
}

/// Initializes `tracing` logging on stderr. The filter is taken from `CRMCONF_LOG` if it is set,
/// otherwise this crate logs at INFO, or DEBUG when `verbose` is given.
pub fn initialize_logging(verbose: bool) {
    let filter = match EnvFilter::try_from_env("CRMCONF_LOG") {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::new(if verbose {
            "crmconf_lib=debug"
        } else {
            "crmconf_lib=info"
        }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
