// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Helpers for tests that work on the documents under `tests/fixtures/`.

use std::path::Path;

use crate::builder::SnapshotBuilder;
use crate::catalog::AgentCatalog;
use crate::config::Config;
use crate::defaults::MetaAttributeDefaults;
use crate::snapshot::ClusterSnapshot;
use crate::version::VersionContext;

/// Given a relative `path` in the test directory, prepend the
/// full path to the test directory.
pub fn test_path(path: &str) -> String {
    std::env::var("CARGO_MANIFEST_DIR").unwrap() + "/tests/" + path
}

/// Read a file under `tests/fixtures/`.
pub fn read_fixture(name: &str) -> String {
    let path = test_path(&format!("fixtures/{name}"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("could not read {path}: {e}"))
}

/// The fixture config, with its document paths resolved.
pub fn fixture_config() -> Config {
    let path = test_path("fixtures/crmconf.conf");
    let config = Config::parse(&read_fixture("crmconf.conf")).unwrap();
    config.relative_to(Path::new(&path))
}

/// A catalog holding every agent listed in the fixture config.
pub fn fixture_catalog(version: &VersionContext) -> AgentCatalog {
    let mut catalog = AgentCatalog::new(version, &MetaAttributeDefaults::default());
    for agent in fixture_config().agents {
        let metadata = std::fs::read_to_string(&agent.metadata).unwrap();
        catalog
            .load_agent_metadata(
                &agent.name,
                agent.provider.as_deref(),
                &agent.class,
                &metadata,
                agent.master_slave,
            )
            .unwrap();
    }
    catalog
}

/// Build a snapshot of the fixture document `name` against the fixture catalog.
pub fn fixture_snapshot(name: &str, version: &VersionContext) -> ClusterSnapshot {
    let catalog = fixture_catalog(version);
    SnapshotBuilder::new(&catalog, version).build(&read_fixture(name))
}
