// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! snapshot.rs
//!
//! The immutable, queryable result of parsing one CIB document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Add;
use std::sync::{Arc, RwLock};

use crate::agent::ResourceAgent;
use crate::constraint::{Colocation, Location, Order, Placement, SetConstraint};
use crate::error::Error;
use crate::resource::ResourceInstance;
use crate::resource_set::ResourceSetConnection;

/// A fail count as recorded in a node's transient attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailCount {
    Count(u64),
    Infinity,
}

impl FailCount {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "INFINITY" | "+INFINITY" => Some(FailCount::Infinity),
            v => v.parse::<u64>().ok().map(FailCount::Count),
        }
    }
}

impl Add for FailCount {
    type Output = FailCount;

    fn add(self, other: FailCount) -> FailCount {
        match (self, other) {
            (FailCount::Count(a), FailCount::Count(b)) => FailCount::Count(a.saturating_add(b)),
            _ => FailCount::Infinity,
        }
    }
}

impl fmt::Display for FailCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailCount::Count(n) => write!(f, "{n}"),
            FailCount::Infinity => write!(f, "INFINITY"),
        }
    }
}

/// Name/value pairs of one attribute block, together with the nvpair ids.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    pub id: Option<String>,
    pub values: BTreeMap<String, String>,
    pub ids: BTreeMap<String, String>,
}

impl AttributeTable {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything known about the cluster at the time the CIB was read.
///
/// Snapshots are never modified. Edits such as adding a member to a resource set return a new
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub(crate) dc: Option<String>,
    pub(crate) fenced: BTreeSet<String>,
    pub(crate) nodes: Vec<String>,
    pub(crate) node_params: BTreeMap<String, BTreeMap<String, String>>,
    pub(crate) online: BTreeSet<String>,
    pub(crate) pending: BTreeSet<String>,

    pub(crate) properties: AttributeTable,
    pub(crate) rsc_defaults: AttributeTable,
    pub(crate) op_defaults: AttributeTable,

    pub(crate) resources: BTreeMap<String, ResourceInstance>,
    pub(crate) resource_order: Vec<String>,
    pub(crate) clone_to_resource: BTreeMap<String, String>,
    pub(crate) groups_to_resources: BTreeMap<String, Vec<String>>,
    pub(crate) masters: BTreeSet<String>,
    pub(crate) meta_attrs_refs: BTreeMap<String, String>,
    pub(crate) operations_refs: BTreeMap<String, String>,

    pub(crate) colocations: Vec<Colocation>,
    pub(crate) orders: Vec<Order>,
    pub(crate) locations: Vec<Location>,
    pub(crate) set_constraints: Vec<SetConstraint>,

    pub(crate) fail_counts: BTreeMap<String, BTreeMap<String, FailCount>>,
    pub(crate) failed_clones: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    pub(crate) ping_metric: BTreeMap<String, String>,
    pub(crate) orphans: BTreeSet<String>,
    pub(crate) orphaned_clone_instances: BTreeSet<String>,

    pub(crate) warnings: Arc<Vec<Error>>,
}

impl ClusterSnapshot {
    /// The snapshot for a document that couldn't be read at all.
    pub(crate) fn unreadable(warning: Error) -> Self {
        tracing::warn!("{warning}");
        ClusterSnapshot {
            warnings: Arc::new(vec![warning]),
            ..Default::default()
        }
    }

    // Nodes

    /// The designated controller ("DC") node.
    pub fn dc(&self) -> Option<&str> {
        self.dc.as_deref()
    }

    /// Nodes in document order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn fenced(&self) -> &BTreeSet<String> {
        &self.fenced
    }

    pub fn is_fenced(&self, node: &str) -> bool {
        self.fenced.contains(node)
    }

    pub fn node_parameters(&self, node: &str) -> Option<&BTreeMap<String, String>> {
        self.node_params.get(node)
    }

    pub fn node_parameter(&self, node: &str, name: &str) -> Option<&str> {
        self.node_params
            .get(node)
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }

    pub fn online(&self) -> &BTreeSet<String> {
        &self.online
    }

    pub fn is_online(&self, node: &str) -> bool {
        self.online.contains(node)
    }

    pub fn pending(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn is_pending(&self, node: &str) -> bool {
        self.pending.contains(node)
    }

    // Global settings

    /// Cluster properties under their canonical (hyphenated) names.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties.values
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name)
    }

    pub fn property_id(&self, name: &str) -> Option<&str> {
        self.properties.ids.get(name).map(String::as_str)
    }

    /// The id of the first `cluster_property_set`.
    pub fn property_set_id(&self) -> Option<&str> {
        self.properties.id.as_deref()
    }

    pub fn rsc_defaults(&self) -> &AttributeTable {
        &self.rsc_defaults
    }

    pub fn op_defaults(&self) -> &AttributeTable {
        &self.op_defaults
    }

    // Resources

    /// Configured resources in document order, followed by orphans.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceInstance> {
        self.resource_order
            .iter()
            .filter_map(|id| self.resources.get(id))
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceInstance> {
        self.resources.get(id)
    }

    pub fn resource_agent(&self, id: &str) -> Option<&Arc<ResourceAgent>> {
        self.resources.get(id).and_then(|r| r.agent())
    }

    /// Top-level resources: everything that isn't a member of a group or clone.
    pub fn top_level_resources(&self) -> impl Iterator<Item = &ResourceInstance> {
        self.resources().filter(|r| r.parent.is_none())
    }

    /// The primitive or group a clone wraps.
    pub fn clone_to_resource(&self, clone: &str) -> Option<&str> {
        self.clone_to_resource.get(clone).map(String::as_str)
    }

    /// The members of a group in document order.
    pub fn groups_to_resources(&self, group: &str) -> Option<&[String]> {
        self.groups_to_resources.get(group).map(Vec::as_slice)
    }

    pub fn masters(&self) -> &BTreeSet<String> {
        &self.masters
    }

    pub fn is_master(&self, clone: &str) -> bool {
        self.masters.contains(clone)
    }

    /// The resource whose meta-attributes `id` refers to with an id-ref.
    pub fn meta_attrs_ref(&self, id: &str) -> Option<&str> {
        self.meta_attrs_refs.get(id).map(String::as_str)
    }

    /// The resource whose operations `id` refers to with an id-ref.
    pub fn operations_ref(&self, id: &str) -> Option<&str> {
        self.operations_refs.get(id).map(String::as_str)
    }

    /// A meta-attribute as it applies to a resource: its own value, the value from the resource
    /// defaults, or the default of the agent's parameter, in that order.
    pub fn effective_meta(&self, id: &str, name: &str) -> Option<&str> {
        let res = self.resources.get(id)?;
        res.parameter(name)
            .or_else(|| self.rsc_defaults.get(name))
            .or_else(|| {
                res.agent()
                    .and_then(|a| a.parameter(name))
                    .filter(|p| p.is_meta)
                    .and_then(|p| p.default.as_deref())
            })
    }

    /// An operation attribute (e.g. `timeout`) as it applies to a resource: the resource's own
    /// override, the operation defaults, or the value the agent declares for that action.
    pub fn effective_op_default(&self, id: &str, op: &str, attribute: &str) -> Option<&str> {
        let res = self.resources.get(id)?;
        res.operation(op)
            .and_then(|o| o.get(attribute))
            .or_else(|| self.op_defaults.get(attribute))
            .or_else(|| {
                let action = res.agent()?.action(op)?;
                match attribute {
                    "timeout" => action.timeout.as_deref(),
                    "interval" => action.interval.as_deref(),
                    "start-delay" => action.start_delay.as_deref(),
                    "depth" => action.depth.as_deref(),
                    "role" => action.role.as_deref(),
                    _ => None,
                }
            })
    }

    // Constraints

    pub fn colocations(&self) -> &[Colocation] {
        &self.colocations
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn locations_for<'a>(&'a self, rsc: &'a str) -> impl Iterator<Item = &'a Location> {
        self.locations.iter().filter(move |l| l.rsc == rsc)
    }

    /// The score with which a resource prefers a node, from a direct placement or an `eq`
    /// uname rule.
    pub fn host_score<'a>(&'a self, rsc: &str, node: &str) -> Option<&'a str> {
        let mut placements = self.locations.iter().filter(|l| l.rsc == rsc);
        placements.find_map(|l| match &l.placement {
            Placement::Host {
                node: n,
                score,
                operation,
                ..
            } if n == node && operation.as_deref().is_none_or(|op| op == "eq") => {
                score.as_deref()
            }
            _ => None,
        })
    }

    pub fn set_constraints(&self) -> &[SetConstraint] {
        &self.set_constraints
    }

    pub fn set_constraint(&self, id: &str) -> Option<&SetConstraint> {
        self.set_constraints.iter().find(|c| c.id == id)
    }

    /// Every connection of every set-based constraint.
    pub fn set_connections(&self) -> impl Iterator<Item = &ResourceSetConnection> {
        self.set_constraints.iter().flat_map(|c| c.connections.iter())
    }

    /// Connections grouped so that each group can be drawn as one placeholder.
    pub fn placeholders(&self) -> Vec<Vec<&ResourceSetConnection>> {
        let mut groups: Vec<Vec<&ResourceSetConnection>> = Vec::new();
        for conn in self.set_connections().filter(|c| !c.is_empty()) {
            match groups.iter_mut().find(|g| g[0].same_placeholder(conn)) {
                Some(group) => group.push(conn),
                None => groups.push(vec![conn]),
            }
        }
        groups
    }

    // Status

    /// The fail count of a resource (or a single clone instance, `id:n`) on a node.
    pub fn failed(&self, node: &str, rsc: &str) -> Option<FailCount> {
        self.fail_counts.get(node)?.get(rsc).copied()
    }

    pub fn fail_counts(&self, node: &str) -> Option<&BTreeMap<String, FailCount>> {
        self.fail_counts.get(node)
    }

    /// Indices of the clone instances of `rsc` that have failed on a node.
    pub fn failed_clones(&self, node: &str, rsc: &str) -> Option<&BTreeSet<String>> {
        self.failed_clones.get(node)?.get(rsc)
    }

    /// Indices of the clone instances of `rsc` that have failed anywhere.
    pub fn all_failed_clones(&self, rsc: &str) -> BTreeSet<String> {
        self.failed_clones
            .values()
            .filter_map(|per_rsc| per_rsc.get(rsc))
            .flatten()
            .cloned()
            .collect()
    }

    /// The connectivity score a ping agent wrote for a node.
    pub fn ping_metric(&self, node: &str) -> Option<&str> {
        self.ping_metric.get(node).map(String::as_str)
    }

    pub fn orphans(&self) -> &BTreeSet<String> {
        &self.orphans
    }

    pub fn is_orphan(&self, id: &str) -> bool {
        self.orphans.contains(id)
    }

    /// Whether resource history mentions instances of a clone that no longer exists.
    pub fn has_orphaned_instances(&self, id: &str) -> bool {
        self.orphaned_clone_instances.contains(id)
    }

    pub fn orphaned_clone_instances(&self) -> &BTreeSet<String> {
        &self.orphaned_clone_instances
    }

    /// Recoverable problems found while building the snapshot.
    pub fn warnings(&self) -> &[Error] {
        &self.warnings
    }

    // Edits

    fn with_set_body(
        &self,
        constraint_id: &str,
        set_index: usize,
        edit: impl FnOnce(&crate::resource_set::ResourceSet) -> crate::resource_set::ResourceSet,
    ) -> ClusterSnapshot {
        let mut next = self.clone();
        let Some(pos) = next.set_constraints.iter().position(|c| c.id == constraint_id) else {
            tracing::debug!("no set constraint {constraint_id}");
            return next;
        };
        let constraint = &next.set_constraints[pos];
        let Some(body) = constraint.bodies.get(set_index) else {
            tracing::debug!("set constraint {constraint_id} has no set {set_index}");
            return next;
        };
        let updated = constraint.with_body(set_index, edit(body));
        next.set_constraints[pos] = updated;
        next
    }

    /// A new snapshot in which resource set `set_index` of constraint `constraint_id` also
    /// contains `member`.
    pub fn with_set_member_added(
        &self,
        constraint_id: &str,
        set_index: usize,
        member: &str,
    ) -> ClusterSnapshot {
        self.with_set_body(constraint_id, set_index, |s| s.with_member(member))
    }

    /// A new snapshot in which resource set `set_index` of constraint `constraint_id` no longer
    /// contains `member`.
    pub fn with_set_member_removed(
        &self,
        constraint_id: &str,
        set_index: usize,
        member: &str,
    ) -> ClusterSnapshot {
        self.with_set_body(constraint_id, set_index, |s| s.without_member(member))
    }
}

/// The current snapshot, replaced wholesale on every refresh. Readers get either the previous
/// snapshot or the new one.
#[derive(Debug, Default)]
pub struct SharedSnapshot {
    current: RwLock<Arc<ClusterSnapshot>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn load(&self) -> Arc<ClusterSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Publish a new snapshot, returning the one it replaced.
    pub fn publish(&self, snapshot: ClusterSnapshot) -> Arc<ClusterSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_set::ResourceSet;

    #[test]
    fn fail_counts_add_up() {
        assert_eq!(FailCount::parse("3"), Some(FailCount::Count(3)));
        assert_eq!(FailCount::parse("INFINITY"), Some(FailCount::Infinity));
        assert_eq!(FailCount::parse("lots"), None);
        assert_eq!(FailCount::Count(1) + FailCount::Count(2), FailCount::Count(3));
        assert_eq!(FailCount::Count(1) + FailCount::Infinity, FailCount::Infinity);
        assert_eq!(FailCount::Infinity.to_string(), "INFINITY");
    }

    #[test]
    fn host_score_outlives_the_query() {
        let host = |id: &str, node: &str, score: &str, operation: Option<&str>| Location {
            id: id.to_string(),
            rsc: "web".to_string(),
            placement: Placement::Host {
                node: node.to_string(),
                score: Some(score.to_string()),
                role: None,
                operation: operation.map(str::to_string),
            },
        };
        let snapshot = ClusterSnapshot {
            locations: vec![
                host("l1", "node1", "100", None),
                host("l2", "node2", "-INFINITY", Some("ne")),
                host("l3", "node3", "50", Some("eq")),
            ],
            ..Default::default()
        };

        let score = {
            let rsc = String::from("web");
            let node = String::from("node1");
            snapshot.host_score(&rsc, &node)
        };
        assert_eq!(score, Some("100"));
        assert_eq!(snapshot.host_score("web", "node2"), None);
        assert_eq!(snapshot.host_score("web", "node3"), Some("50"));
        assert_eq!(snapshot.host_score("db", "node1"), None);
    }

    fn set_snapshot() -> ClusterSnapshot {
        let members = |m: &[&str]| m.iter().map(|s| s.to_string()).collect();
        let col = SetConstraint::new(
            "col",
            true,
            Some("INFINITY".to_string()),
            vec![
                ResourceSet::new("c1", members(&["A"]), false, None, None),
                ResourceSet::new("c2", members(&["B"]), false, None, None),
            ],
        );
        let ord = SetConstraint::new(
            "ord",
            false,
            None,
            vec![ResourceSet::new("o1", members(&["B", "A"]), true, None, None)],
        );
        ClusterSnapshot {
            set_constraints: vec![col, ord],
            ..Default::default()
        }
    }

    #[test]
    fn placeholders_merge_across_kinds() {
        let snapshot = set_snapshot();
        let groups = snapshot.placeholders();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn edits_leave_the_original_alone() {
        let snapshot = set_snapshot();
        let edited = snapshot.with_set_member_removed("ord", 0, "A");

        assert_eq!(snapshot.set_constraint("ord").unwrap().connections.len(), 1);
        let ord = edited.set_constraint("ord").unwrap();
        assert_eq!(ord.connections.len(), 1);
        assert!(ord.connections[0].is_dangling());

        let grown = edited.with_set_member_added("col", 1, "C");
        let col = grown.set_constraint("col").unwrap();
        assert_eq!(col.bodies[1].members(), ["B", "C"]);
        assert_eq!(snapshot.set_constraint("col").unwrap().bodies[1].members(), ["B"]);

        // unknown targets leave the snapshot as it was
        let same = snapshot.with_set_member_added("nope", 0, "C");
        assert_eq!(same.set_constraints().len(), 2);
        let same = snapshot.with_set_member_added("col", 7, "C");
        assert_eq!(same.set_constraint("col").unwrap().bodies.len(), 2);
    }

    #[test]
    fn shared_snapshot_swaps() {
        let shared = SharedSnapshot::default();
        let before = shared.load();
        assert!(before.dc().is_none());

        let next = ClusterSnapshot {
            dc: Some("node1".to_string()),
            ..Default::default()
        };
        let old = shared.publish(next);
        assert!(old.dc().is_none());
        assert_eq!(shared.load().dc(), Some("node1"));
        // a reader holding the old snapshot still sees it
        assert!(before.dc().is_none());
    }
}
