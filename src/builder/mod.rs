// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! builder
//!
//! Walks a CIB document and assembles a `ClusterSnapshot`.
//!
//! The walk follows the document: nodes and cluster-wide settings first, then resources, then
//! constraints, then the status section. References between attribute blocks (`id-ref`) are
//! only collected while resources are read and are resolved once all resources are known, so
//! that a reference may point forward in the document.
//!
//! Building never fails. Anything unexpected is recorded as a warning in the snapshot and the
//! affected part of the document is skipped or replaced by a placeholder.

mod constraints;
mod resources;
mod status;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use elementtree::Element;

use crate::agent::AgentId;
use crate::catalog::AgentCatalog;
use crate::error::Error;
use crate::resource::Operation;
use crate::snapshot::{AttributeTable, ClusterSnapshot};
use crate::version::VersionContext;
use crate::xml::{self, attr, attr_string, Nvpair};

pub struct SnapshotBuilder<'a> {
    catalog: &'a AgentCatalog,
    version: &'a VersionContext,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(catalog: &'a AgentCatalog, version: &'a VersionContext) -> Self {
        Self { catalog, version }
    }

    /// Build a snapshot from CIB text. A document that can't be parsed at all yields an empty
    /// snapshot whose only content is the warning.
    pub fn build(&self, text: &str) -> ClusterSnapshot {
        let root = match xml::parse(text) {
            Ok(root) => root,
            Err(e) => return ClusterSnapshot::unreadable(Error::MalformedDocument(e)),
        };
        let mut walk = Walk::new(self.catalog, self.version);
        walk.document(&root);
        walk.finish()
    }

    /// Like `build`, for an already parsed document.
    pub fn build_from_element(&self, root: &Element) -> ClusterSnapshot {
        let mut walk = Walk::new(self.catalog, self.version);
        walk.document(root);
        walk.finish()
    }
}

/// An attribute block that other resources may refer to by id.
#[derive(Debug)]
struct SharedBlock<T> {
    owner: String,
    content: T,
}

/// The state of one pass over a document.
struct Walk<'a> {
    catalog: &'a AgentCatalog,
    version: &'a VersionContext,
    snapshot: ClusterSnapshot,
    warnings: Vec<Error>,
    warned_agents: BTreeSet<AgentId>,
    /// node id -> uname
    node_ids: BTreeMap<String, String>,
    meta_blocks: BTreeMap<String, SharedBlock<Vec<Nvpair>>>,
    op_blocks: BTreeMap<String, SharedBlock<BTreeMap<String, Operation>>>,
    /// (resource, referenced block id) pairs, resolved after the resource walk.
    meta_refs: Vec<(String, String)>,
    op_refs: Vec<(String, String)>,
}

impl<'a> Walk<'a> {
    fn new(catalog: &'a AgentCatalog, version: &'a VersionContext) -> Self {
        Self {
            catalog,
            version,
            snapshot: ClusterSnapshot::default(),
            warnings: Vec::new(),
            warned_agents: BTreeSet::new(),
            node_ids: BTreeMap::new(),
            meta_blocks: BTreeMap::new(),
            op_blocks: BTreeMap::new(),
            meta_refs: Vec::new(),
            op_refs: Vec::new(),
        }
    }

    fn warn(&mut self, warning: Error) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn finish(mut self) -> ClusterSnapshot {
        self.snapshot.warnings = Arc::new(self.warnings);
        self.snapshot
    }

    fn document(&mut self, root: &Element) {
        let tag = root.tag().name();
        let cib = if tag == "cib" {
            root
        } else {
            if let Some(fenced) = root.find("fenced") {
                self.snapshot.fenced = fenced
                    .find_all("node")
                    .map(|n| n.text().trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();
            }
            match root.find("cib") {
                Some(cib) => cib,
                None => {
                    self.warn(Error::UnexpectedRoot {
                        expected: "cib".to_string(),
                        found: tag.to_string(),
                    });
                    return;
                }
            }
        };

        match cib.find("configuration") {
            Some(config) => self.configuration(config),
            None => tracing::debug!("document has no configuration section"),
        }

        if let Some(dc_uuid) = attr(cib, "dc-uuid") {
            match self.node_ids.get(dc_uuid) {
                Some(uname) => self.snapshot.dc = Some(uname.clone()),
                None => self.warn(Error::UnresolvedReference {
                    resource: "cib".to_string(),
                    kind: "node",
                    target: dc_uuid.to_string(),
                }),
            }
        }

        if let Some(status) = cib.find("status") {
            self.status(status);
        }
    }

    fn configuration(&mut self, config: &Element) {
        if let Some(nodes) = config.find("nodes") {
            self.nodes(nodes);
        }
        if self.version.has_defaults_sections() {
            if let Some(defaults) = config.find("rsc_defaults") {
                self.snapshot.rsc_defaults = self.defaults(defaults);
            }
            if let Some(defaults) = config.find("op_defaults") {
                self.snapshot.op_defaults = self.defaults(defaults);
            }
        }
        if let Some(crm_config) = config.find("crm_config") {
            self.properties(crm_config);
        }
        if let Some(resources) = config.find("resources") {
            self.resources(resources);
        }
        self.resolve_refs();
        if let Some(constraints) = config.find("constraints") {
            self.constraints(constraints);
        }
    }

    fn nodes(&mut self, nodes: &Element) {
        for node in nodes.find_all("node") {
            let Some(uname) = attr_string(node, "uname") else {
                self.warn(Error::missing("node", "uname"));
                continue;
            };
            let id = attr_string(node, "id").unwrap_or_else(|| uname.clone());
            self.node_ids.insert(id, uname.clone());

            let params: BTreeMap<String, String> = node
                .find_all("instance_attributes")
                .flat_map(|block| xml::nvpairs(block, self.version))
                .map(|nv| (nv.name, nv.value))
                .collect();
            self.snapshot.node_params.insert(uname.clone(), params);
            if !self.snapshot.nodes.contains(&uname) {
                self.snapshot.nodes.push(uname);
            }
        }
    }

    /// Read `rsc_defaults` or `op_defaults`. The pairs normally live in `meta_attributes` blocks,
    /// but may also appear directly under the section.
    fn defaults(&self, section: &Element) -> AttributeTable {
        let mut blocks: Vec<&Element> = section.find_all("meta_attributes").collect();
        if blocks.is_empty() {
            blocks.push(section);
        }
        let mut table = AttributeTable {
            id: attr_string(blocks[0], "id"),
            ..Default::default()
        };
        for block in blocks {
            add_pairs(&mut table, xml::nvpairs(block, self.version));
        }
        table
    }

    fn properties(&mut self, crm_config: &Element) {
        let mut table = AttributeTable::default();
        for set in crm_config.find_all("cluster_property_set") {
            if table.id.is_none() {
                table.id = attr_string(set, "id");
            }
            let pairs = xml::nvpairs(set, self.version)
                .into_iter()
                .map(|nv| Nvpair {
                    name: self.version.canonical_property_name(&nv.name),
                    ..nv
                })
                .collect();
            add_pairs(&mut table, pairs);
        }
        self.snapshot.properties = table;
    }

    fn node_name(&self, node_state: &Element) -> Option<String> {
        attr_string(node_state, "uname").or_else(|| {
            attr(node_state, "id").and_then(|id| self.node_ids.get(id).cloned())
        })
    }
}

fn add_pairs(table: &mut AttributeTable, pairs: Vec<Nvpair>) {
    for nv in pairs {
        if let Some(id) = nv.id {
            table.ids.insert(nv.name.clone(), id);
        }
        table.values.insert(nv.name, nv.value);
    }
}
