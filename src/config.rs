// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::version::VersionContext;

/// The configuration file names documents that were already fetched from a cluster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub heartbeat_version: Option<String>,
    pub pacemaker_version: Option<String>,

    /// Path to the CIB document.
    pub cib: PathBuf,

    /// Path to a `crm_mon --as-xml` document.
    pub status: Option<PathBuf>,

    /// Agents whose metadata should be loaded into the catalog.
    #[serde(default)]
    pub agents: Vec<Agent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Agent {
    /// The agent standard, such as "ocf", "lsb" or "stonith".
    #[serde(default = "default_class")]
    pub class: String,

    pub provider: Option<String>,

    /// The agent type, such as "IPaddr2".
    pub name: String,

    /// Path to the output of the agent's `meta-data` action.
    pub metadata: PathBuf,

    /// Treat the agent as master/slave capable even if its metadata doesn't say so.
    #[serde(default)]
    pub master_slave: bool,
}

fn default_class() -> String {
    "ocf".to_string()
}

impl Config {
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn version(&self) -> VersionContext {
        VersionContext::new(
            self.heartbeat_version.as_deref(),
            self.pacemaker_version.as_deref(),
        )
    }

    /// Resolve relative document paths against the directory the config file is in.
    pub fn relative_to(mut self, config_path: &Path) -> Self {
        let Some(base) = config_path.parent() else {
            return self;
        };
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.cib);
        if let Some(status) = self.status.as_mut() {
            fix(status);
        }
        for agent in self.agents.iter_mut() {
            fix(&mut agent.metadata);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config: Config = toml::from_str(
            r#"
heartbeat_version = "2.1.3"
cib = "cib.xml"

[[agents]]
provider = "heartbeat"
name = "IPaddr2"
metadata = "agents/IPaddr2.xml"

[[agents]]
class = "stonith"
name = "fence_ipmilan"
metadata = "/abs/fence_ipmilan.xml"
master_slave = false
"#,
        )
        .unwrap();

        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].class, "ocf");
        assert!(!config.agents[0].master_slave);
        assert!(config.status.is_none());
        assert!(config.version().has_attributes_wrapper());

        let config = config.relative_to(Path::new("/etc/crmconf/crmconf.conf"));
        assert_eq!(config.cib, PathBuf::from("/etc/crmconf/cib.xml"));
        assert_eq!(
            config.agents[0].metadata,
            PathBuf::from("/etc/crmconf/agents/IPaddr2.xml")
        );
        assert_eq!(config.agents[1].metadata, PathBuf::from("/abs/fence_ipmilan.xml"));
    }

    #[test]
    fn cib_is_required() {
        assert!(matches!(
            Config::parse("status = \"s.xml\""),
            Err(crate::Error::Config(_))
        ));
    }
}
