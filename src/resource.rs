// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agent::ResourceAgent;

/// What a configured resource is.
#[derive(Debug, Clone)]
pub enum ResourceKind {
    /// A single service bound to one resource agent.
    Primitive { agent: Arc<ResourceAgent> },
    /// Members in document order.
    Group { members: Vec<String> },
    /// A clone wraps exactly one primitive or group. A `master` clone (or one that is
    /// promotable) runs its instances in master and slave roles.
    Clone { inner: Option<String>, master: bool },
}

/// An operation override, e.g. `<op name="monitor" interval="10s"/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    pub id: Option<String>,
    /// Every attribute of the op element other than its id and name, plus any nvpairs of its
    /// own `instance_attributes`.
    pub attributes: BTreeMap<String, String>,
}

impl Operation {
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }
}

/// One resource of the configuration.
#[derive(Debug, Clone)]
pub struct ResourceInstance {
    pub id: String,
    pub kind: ResourceKind,
    /// Instance attributes and meta-attributes, merged. Meta-attributes win on collision.
    pub parameters: BTreeMap<String, String>,
    /// The nvpair id each parameter was read from, needed to edit it in place.
    pub param_ids: BTreeMap<String, String>,
    pub instance_attrs_id: Option<String>,
    pub meta_attrs_id: Option<String>,
    pub operations_id: Option<String>,
    /// Operation overrides keyed by action name. A second override for the same action (e.g. a
    /// role-specific monitor) is keyed `<name>:<role>`.
    pub operations: BTreeMap<String, Operation>,
    /// The group or clone this resource is a member of.
    pub parent: Option<String>,
    /// Synthesized from resource history, not found in the configuration.
    pub orphaned: bool,
}

impl ResourceInstance {
    pub fn new(id: &str, kind: ResourceKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            parameters: BTreeMap::new(),
            param_ids: BTreeMap::new(),
            instance_attrs_id: None,
            meta_attrs_id: None,
            operations_id: None,
            operations: BTreeMap::new(),
            parent: None,
            orphaned: false,
        }
    }

    pub fn agent(&self) -> Option<&Arc<ResourceAgent>> {
        match &self.kind {
            ResourceKind::Primitive { agent } => Some(agent),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ResourceKind::Group { .. })
    }

    pub fn is_clone(&self) -> bool {
        matches!(self.kind, ResourceKind::Clone { .. })
    }

    pub fn is_master(&self) -> bool {
        matches!(self.kind, ResourceKind::Clone { master: true, .. })
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Short description of the resource type, e.g. `ocf:heartbeat:IPaddr2` or `group`.
    pub fn type_string(&self) -> String {
        match &self.kind {
            ResourceKind::Primitive { agent } => agent.id().to_string(),
            ResourceKind::Group { .. } => "group".to_string(),
            ResourceKind::Clone { master: true, .. } => "master".to_string(),
            ResourceKind::Clone { .. } => "clone".to_string(),
        }
    }

    /// Return a string representation of this resource's parameters in a predictable way.
    pub fn params_string(&self) -> String {
        let pairs: Vec<String> = self
            .parameters
            .iter()
            .map(|(k, v)| format!("\"{k}\": \"{v}\""))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }
}
