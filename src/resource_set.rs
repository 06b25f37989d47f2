// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! resource_set.rs
//!
//! Ordering and colocation constraints may name ordered groups of resources ("resource sets")
//! instead of two single resources. This module turns the sets attached to one constraint into
//! pairwise connections that can be drawn as edges, and decides when two such edges should share
//! one placeholder.

use std::sync::Arc;

/// An ordered group of resource references attached to one constraint.
///
/// ResourceSets are values: they are never modified once built. `with_member` and
/// `without_member` return new sets.
#[derive(Debug, Clone)]
pub struct ResourceSet {
    id: String,
    members: Vec<String>,
    sequential: bool,
    /// Order constraints only: the action applied to every member.
    action: Option<String>,
    /// Colocation constraints only: the role every member must be in.
    role: Option<String>,
}

impl ResourceSet {
    pub fn new(
        id: &str,
        members: Vec<String>,
        sequential: bool,
        action: Option<String>,
        role: Option<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            members,
            sequential,
            action,
            role,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }

    /// Two sets are equal when they hold the same members, in any order.
    pub fn equals(&self, other: &ResourceSet) -> bool {
        self.is_subset_of(other) && other.is_subset_of(self)
    }

    /// Every member of this set is also a member of `other`.
    pub fn is_subset_of(&self, other: &ResourceSet) -> bool {
        self.members.iter().all(|m| other.contains(m))
    }

    /// A copy of this set with `id` appended, if it isn't already a member.
    pub fn with_member(&self, id: &str) -> Self {
        let mut new = self.clone();
        if !new.contains(id) {
            new.members.push(id.to_string());
        }
        new
    }

    /// A copy of this set with `id` removed.
    pub fn without_member(&self, id: &str) -> Self {
        let mut new = self.clone();
        new.members.retain(|m| m != id);
        new
    }
}

impl PartialEq for ResourceSet {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for ResourceSet {}

/// An edge between two resource sets of the same constraint, or a dangling edge for a set with
/// no partner.
#[derive(Debug, Clone)]
pub struct ResourceSetConnection {
    set1: Arc<ResourceSet>,
    set2: Option<Arc<ResourceSet>>,
    constraint_id: String,
    position: usize,
    is_colocation: bool,
}

fn sets_equal(a: Option<&ResourceSet>, b: Option<&ResourceSet>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.equals(b),
        _ => false,
    }
}

/// Equal, or one a non-empty subset of the other.
fn sets_overlap(a: Option<&ResourceSet>, b: Option<&ResourceSet>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.equals(b)
                || (!a.is_empty() && !b.is_empty() && (a.is_subset_of(b) || b.is_subset_of(a)))
        }
        _ => false,
    }
}

impl ResourceSetConnection {
    pub fn new(
        set1: Arc<ResourceSet>,
        set2: Option<Arc<ResourceSet>>,
        constraint_id: &str,
        position: usize,
        is_colocation: bool,
    ) -> Self {
        Self {
            set1,
            set2,
            constraint_id: constraint_id.to_string(),
            position,
            is_colocation,
        }
    }

    pub fn set1(&self) -> &ResourceSet {
        &self.set1
    }

    pub fn set2(&self) -> Option<&ResourceSet> {
        self.set2.as_deref()
    }

    pub fn constraint_id(&self) -> &str {
        &self.constraint_id
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_colocation(&self) -> bool {
        self.is_colocation
    }

    /// A connection for a set that isn't chained to any other set.
    pub fn is_dangling(&self) -> bool {
        self.set2.is_none()
    }

    /// A connection whose sets have all been emptied.
    pub fn is_empty(&self) -> bool {
        self.set1.is_empty() && self.set2.as_ref().is_none_or(|s| s.is_empty())
    }

    /// Same kind of constraint, and the same sets on the same sides.
    pub fn equals(&self, other: &ResourceSetConnection) -> bool {
        self.is_colocation == other.is_colocation
            && sets_equal(Some(self.set1()), Some(other.set1()))
            && sets_equal(self.set2(), other.set2())
    }

    /// Whether two connections can be drawn as one placeholder.
    ///
    /// Connections of the same kind must be equal. An order and a colocation connection share a
    /// placeholder if their sides match either straight or swapped, where each side may also be
    /// a non-empty subset of the other.
    pub fn same_placeholder(&self, other: &ResourceSetConnection) -> bool {
        if self.is_colocation == other.is_colocation {
            return self.equals(other);
        }
        let (a1, a2) = (Some(self.set1()), self.set2());
        let (b1, b2) = (Some(other.set1()), other.set2());
        (sets_overlap(a1, b2) && sets_overlap(a2, b1))
            || (sets_overlap(a1, b1) && sets_overlap(a2, b2))
    }
}

/// Split a sequential set of several resources into a chain of single-resource sets. Each part
/// keeps the id and per-set options of the set it came from.
fn split_sequential(body: &ResourceSet) -> Vec<ResourceSet> {
    if body.sequential && body.members.len() > 1 {
        body.members
            .iter()
            .map(|m| {
                ResourceSet::new(
                    &body.id,
                    vec![m.clone()],
                    true,
                    body.action.clone(),
                    body.role.clone(),
                )
            })
            .collect()
    } else {
        vec![body.clone()]
    }
}

/// Chain already-expanded sets into connections, in order. Empty sets take no part.
///
/// Colocation connections point from the later set to the earlier one ("B with A"), order
/// connections from the earlier to the later ("A before B").
pub fn connect(
    sets: &[Arc<ResourceSet>],
    constraint_id: &str,
    is_colocation: bool,
) -> Vec<ResourceSetConnection> {
    let live: Vec<&Arc<ResourceSet>> = sets.iter().filter(|s| !s.is_empty()).collect();

    if let [only] = live.as_slice() {
        return vec![ResourceSetConnection::new(
            Arc::clone(only),
            None,
            constraint_id,
            0,
            is_colocation,
        )];
    }

    live.windows(2)
        .enumerate()
        .map(|(position, pair)| {
            let (prev, cur) = (Arc::clone(pair[0]), Arc::clone(pair[1]));
            let (set1, set2) = if is_colocation {
                (cur, prev)
            } else {
                (prev, cur)
            };
            ResourceSetConnection::new(set1, Some(set2), constraint_id, position, is_colocation)
        })
        .collect()
}

/// Expand the resource set bodies of one constraint, in document order, into the resulting sets
/// and the connections between them.
pub fn expand(
    bodies: &[ResourceSet],
    constraint_id: &str,
    is_colocation: bool,
) -> (Vec<Arc<ResourceSet>>, Vec<ResourceSetConnection>) {
    let sets: Vec<Arc<ResourceSet>> = bodies
        .iter()
        .filter(|b| !b.is_empty())
        .flat_map(split_sequential)
        .map(Arc::new)
        .collect();
    let connections = connect(&sets, constraint_id, is_colocation);
    (sets, connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, members: &[&str], sequential: bool) -> ResourceSet {
        ResourceSet::new(
            id,
            members.iter().map(|m| m.to_string()).collect(),
            sequential,
            None,
            None,
        )
    }

    fn arc(members: &[&str]) -> Arc<ResourceSet> {
        Arc::new(set("s", members, false))
    }

    fn members(s: Option<&ResourceSet>) -> Vec<String> {
        s.map(|s| s.members().to_vec()).unwrap_or_default()
    }

    #[test]
    fn equality_and_subsets() {
        let ab = set("x", &["A", "B"], false);
        let ba = set("y", &["B", "A"], true);
        let a = set("z", &["A"], false);

        assert!(ab.equals(&ba));
        assert_eq!(ab, ba);
        assert!(a.is_subset_of(&ab));
        assert!(!ab.is_subset_of(&a));
        assert!(!a.equals(&ab));
    }

    #[test]
    fn sequential_set_is_chained() {
        let (sets, conns) = expand(&[set("s1", &["A", "B", "C"], true)], "ord", false);
        assert_eq!(sets.len(), 3);
        assert_eq!(conns.len(), 2);

        assert_eq!(conns[0].position(), 0);
        assert_eq!(members(Some(conns[0].set1())), ["A"]);
        assert_eq!(members(conns[0].set2()), ["B"]);

        assert_eq!(conns[1].position(), 1);
        assert_eq!(members(Some(conns[1].set1())), ["B"]);
        assert_eq!(members(conns[1].set2()), ["C"]);
        assert!(conns.iter().all(|c| c.constraint_id() == "ord"));
    }

    #[test]
    fn colocation_is_reversed() {
        let bodies = [set("s1", &["A", "B"], false), set("s2", &["C"], false)];

        let (_, order) = expand(&bodies, "ord", false);
        assert_eq!(order.len(), 1);
        assert_eq!(members(Some(order[0].set1())), ["A", "B"]);
        assert_eq!(members(order[0].set2()), ["C"]);

        let (_, colocation) = expand(&bodies, "col", true);
        assert_eq!(colocation.len(), 1);
        assert!(colocation[0].is_colocation());
        assert_eq!(members(Some(colocation[0].set1())), ["C"]);
        assert_eq!(members(colocation[0].set2()), ["A", "B"]);
    }

    #[test]
    fn single_set_dangles() {
        let (sets, conns) = expand(&[set("s1", &["A", "B"], false)], "col", true);
        assert_eq!(sets.len(), 1);
        assert_eq!(conns.len(), 1);
        assert!(conns[0].is_dangling());
        assert_eq!(conns[0].position(), 0);
    }

    #[test]
    fn empty_sets_are_excluded() {
        let (sets, conns) = expand(&[set("s1", &[], false)], "col", true);
        assert!(sets.is_empty());
        assert!(conns.is_empty());

        let (_, conns) = expand(
            &[set("s1", &["A"], false), set("s2", &[], false), set("s3", &["B"], false)],
            "ord",
            false,
        );
        assert_eq!(conns.len(), 1);
        assert_eq!(members(conns[0].set2()), ["B"]);
    }

    #[test]
    fn placeholders_across_kinds() {
        let col = ResourceSetConnection::new(arc(&["A"]), Some(arc(&["B"])), "c", 0, true);
        let ord = ResourceSetConnection::new(arc(&["B"]), Some(arc(&["A"])), "o", 0, false);
        assert!(col.same_placeholder(&ord));
        assert!(ord.same_placeholder(&col));

        // subsets also merge across kinds
        let ord_sub = ResourceSetConnection::new(arc(&["B", "C"]), Some(arc(&["A"])), "o", 0, false);
        assert!(col.same_placeholder(&ord_sub));

        let unrelated = ResourceSetConnection::new(arc(&["D"]), Some(arc(&["E"])), "o", 0, false);
        assert!(!col.same_placeholder(&unrelated));
    }

    #[test]
    fn placeholders_same_kind_need_equality() {
        let a = ResourceSetConnection::new(arc(&["A"]), Some(arc(&["B"])), "c1", 0, true);
        let b = ResourceSetConnection::new(arc(&["A"]), Some(arc(&["B", "C"])), "c2", 0, true);
        let c = ResourceSetConnection::new(arc(&["A"]), Some(arc(&["B"])), "c3", 1, true);
        assert!(!a.same_placeholder(&b));
        assert!(a.same_placeholder(&c));

        let dangling = ResourceSetConnection::new(arc(&["A"]), None, "c4", 0, true);
        assert!(!a.same_placeholder(&dangling));
    }

    #[test]
    fn copy_on_write() {
        let original = set("s", &["A", "B"], false);
        let smaller = original.without_member("A");
        let bigger = original.with_member("C");

        assert_eq!(original.members(), ["A", "B"]);
        assert_eq!(smaller.members(), ["B"]);
        assert_eq!(bigger.members(), ["A", "B", "C"]);
        assert_eq!(original.with_member("A").members(), ["A", "B"]);
        assert!(original.without_member("A").without_member("B").is_empty());
    }
}
