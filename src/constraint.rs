// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Constraint records as stored in a snapshot, already normalized to one vocabulary
//! regardless of the schema revision they were read from.

use std::sync::Arc;

use crate::resource_set::{ResourceSet, ResourceSetConnection};

/// "rsc must (or must not) run on the same node as with_rsc".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colocation {
    pub id: String,
    pub rsc: String,
    pub with_rsc: String,
    pub rsc_role: Option<String>,
    pub with_rsc_role: Option<String>,
    pub score: Option<String>,
}

/// "first must be acted on before then". Records are always stored in this order, whatever
/// the document said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub first: String,
    pub then: String,
    pub first_action: Option<String>,
    pub then_action: Option<String>,
    pub score: Option<String>,
    /// The `kind` attribute (Mandatory, Optional or Serialize) of newer schemas.
    pub kind: Option<String>,
    pub symmetrical: bool,
}

/// Where a location constraint places its resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// A score for one named node, given either directly or by a `#uname` rule.
    Host {
        node: String,
        score: Option<String>,
        role: Option<String>,
        /// The rule expression operation, `eq` or `ne`. `None` for direct placements.
        operation: Option<String>,
    },
    /// A rule over a node attribute, such as the connectivity metric of a ping agent.
    Metric {
        attribute: String,
        operation: String,
        value: Option<String>,
        score: Option<String>,
        score_attribute: Option<String>,
    },
}

impl Placement {
    pub fn node(&self) -> Option<&str> {
        match self {
            Placement::Host { node, .. } => Some(node),
            Placement::Metric { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub rsc: String,
    pub placement: Placement,
}

/// An order or colocation constraint written in terms of resource sets.
#[derive(Debug, Clone)]
pub struct SetConstraint {
    pub id: String,
    pub is_colocation: bool,
    pub score: Option<String>,
    /// The bodies as written, before sequential sets were split. Edits apply here.
    pub bodies: Vec<ResourceSet>,
    pub sets: Vec<Arc<ResourceSet>>,
    pub connections: Vec<ResourceSetConnection>,
}

impl SetConstraint {
    pub fn new(id: &str, is_colocation: bool, score: Option<String>, bodies: Vec<ResourceSet>) -> Self {
        let (sets, connections) = crate::resource_set::expand(&bodies, id, is_colocation);
        Self {
            id: id.to_string(),
            is_colocation,
            score,
            bodies,
            sets,
            connections,
        }
    }

    /// A copy with the body at `index` replaced and connections derived afresh.
    pub fn with_body(&self, index: usize, body: ResourceSet) -> Self {
        let mut bodies = self.bodies.clone();
        if let Some(slot) = bodies.get_mut(index) {
            *slot = body;
        }
        Self::new(&self.id, self.is_colocation, self.score.clone(), bodies)
    }

    /// Every resource mentioned by any of the sets.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.bodies
            .iter()
            .flat_map(|b| b.members().iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(id: &str, members: &[&str], sequential: bool) -> ResourceSet {
        ResourceSet::new(
            id,
            members.iter().map(|m| m.to_string()).collect(),
            sequential,
            None,
            None,
        )
    }

    #[test]
    fn set_constraint_derives_connections() {
        let c = SetConstraint::new("ord", false, None, vec![body("s1", &["A", "B", "C"], true)]);
        assert_eq!(c.connections.len(), 2);
        assert_eq!(c.resources().collect::<Vec<_>>(), ["A", "B", "C"]);

        let trimmed = c.with_body(0, c.bodies[0].without_member("B"));
        assert_eq!(trimmed.connections.len(), 1);
        assert_eq!(c.connections.len(), 2);

        let emptied = trimmed.with_body(0, body("s1", &[], true));
        assert!(emptied.connections.is_empty());
    }
}
