// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use elementtree::Element;

use super::Walk;
use crate::constraint::{Colocation, Location, Order, Placement, SetConstraint};
use crate::error::Error;
use crate::resource_set::ResourceSet;
use crate::xml::{attr, attr_bool, attr_string};

/// The `type` of an old order constraint that reverses its endpoints.
const ORDER_REVERSED: &str = "before";

const UNAME: &str = "#uname";

fn resource_set(elem: &Element) -> ResourceSet {
    let members = elem
        .find_all("resource_ref")
        .filter_map(|r| attr_string(r, "id"))
        .collect();
    ResourceSet::new(
        attr(elem, "id").unwrap_or_default(),
        members,
        attr_bool(elem, "sequential", true),
        attr_string(elem, "action"),
        attr_string(elem, "role"),
    )
}

impl Walk<'_> {
    pub(super) fn constraints(&mut self, constraints: &Element) {
        for elem in constraints.children() {
            match elem.tag().name() {
                "rsc_colocation" => self.colocation(elem),
                "rsc_order" => self.order(elem),
                "rsc_location" => self.location(elem),
                other => tracing::debug!("skipping <{other}> in constraints"),
            }
        }
    }

    fn constraint_id(&mut self, elem: &Element) -> Option<String> {
        let id = attr_string(elem, "id");
        if id.is_none() {
            self.warn(Error::missing(elem.tag().name(), "id"));
        }
        id
    }

    /// A constraint without both endpoints is made of resource sets.
    fn set_constraint(
        &mut self,
        elem: &Element,
        id: String,
        is_colocation: bool,
        endpoint: &'static str,
    ) {
        let bodies: Vec<ResourceSet> = elem.find_all("resource_set").map(resource_set).collect();
        if bodies.is_empty() {
            self.warn(Error::missing(format!("{} {id}", elem.tag().name()), endpoint));
            return;
        }
        let score = attr_string(elem, "score");
        self.snapshot
            .set_constraints
            .push(SetConstraint::new(&id, is_colocation, score, bodies));
    }

    fn colocation(&mut self, elem: &Element) {
        let Some(id) = self.constraint_id(elem) else {
            return;
        };
        let names = self.version.colocation_attributes();
        match (attr_string(elem, names.rsc), attr_string(elem, names.with_rsc)) {
            (Some(rsc), Some(with_rsc)) => self.snapshot.colocations.push(Colocation {
                id,
                rsc,
                with_rsc,
                rsc_role: attr_string(elem, names.rsc_role),
                with_rsc_role: attr_string(elem, names.with_rsc_role),
                score: attr_string(elem, "score"),
            }),
            _ => self.set_constraint(elem, id, true, names.rsc),
        }
    }

    fn order(&mut self, elem: &Element) {
        let Some(id) = self.constraint_id(elem) else {
            return;
        };
        let names = self.version.order_attributes();
        let (Some(mut first), Some(mut then)) =
            (attr_string(elem, names.first), attr_string(elem, names.then))
        else {
            self.set_constraint(elem, id, false, names.first);
            return;
        };
        let mut first_action = attr_string(elem, names.first_action);
        let mut then_action = attr_string(elem, names.then_action);

        if attr(elem, "type") == Some(ORDER_REVERSED) {
            std::mem::swap(&mut first, &mut then);
            std::mem::swap(&mut first_action, &mut then_action);
        }

        self.snapshot.orders.push(Order {
            id,
            first,
            then,
            first_action,
            then_action,
            score: attr_string(elem, "score"),
            kind: attr_string(elem, "kind"),
            symmetrical: attr_bool(elem, "symmetrical", true),
        });
    }

    fn location(&mut self, elem: &Element) {
        let Some(id) = self.constraint_id(elem) else {
            return;
        };
        let Some(rsc) = attr_string(elem, "rsc") else {
            if elem.find("resource_set").is_some() {
                tracing::debug!("skipping location {id} over a resource set");
            } else {
                self.warn(Error::missing(format!("rsc_location {id}"), "rsc"));
            }
            return;
        };

        if let Some(node) = attr_string(elem, "node") {
            self.snapshot.locations.push(Location {
                id: id.clone(),
                rsc: rsc.clone(),
                placement: Placement::Host {
                    node,
                    score: attr_string(elem, "score"),
                    role: attr_string(elem, "role"),
                    operation: None,
                },
            });
        }

        for rule in elem.find_all("rule") {
            let score = attr_string(rule, "score");
            let score_attribute = attr_string(rule, "score-attribute");
            let role = attr_string(rule, "role");
            for expr in rule.find_all("expression") {
                let Some(attribute) = attr(expr, "attribute") else {
                    continue;
                };
                let operation = attr(expr, "operation").unwrap_or("eq").to_string();
                let placement = if attribute == UNAME {
                    let Some(node) = attr_string(expr, "value") else {
                        continue;
                    };
                    Placement::Host {
                        node,
                        score: score.clone(),
                        role: role.clone(),
                        operation: Some(operation),
                    }
                } else {
                    Placement::Metric {
                        attribute: attribute.to_string(),
                        operation,
                        value: attr_string(expr, "value"),
                        score: score.clone(),
                        score_attribute: score_attribute.clone(),
                    }
                };
                self.snapshot.locations.push(Location {
                    id: id.clone(),
                    rsc: rsc.clone(),
                    placement,
                });
            }
        }
    }
}
