// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use elementtree::Element;

use super::Walk;
use crate::error::Error;
use crate::resource::{ResourceInstance, ResourceKind};
use crate::snapshot::FailCount;
use crate::xml::{self, attr};

const FAIL_COUNT_PREFIX: &str = "fail-count-";

/// The node attribute ping agents write by default.
const PING_ATTRIBUTE: &str = "pingd";

/// Split a clone instance id `rsc:n` into `rsc` and `n`.
pub(crate) fn split_instance(id: &str) -> Option<(&str, &str)> {
    let (base, index) = id.rsplit_once(':')?;
    let numeric = !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit());
    (numeric && !base.is_empty()).then_some((base, index))
}

/// Newer versions record when a node joined instead of a boolean.
fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| xml::is_true(v) || v.parse::<u64>().is_ok_and(|t| t > 0))
}

fn crmd_online(value: Option<&str>) -> bool {
    value == Some("online") || is_set(value)
}

impl Walk<'_> {
    pub(super) fn status(&mut self, status: &Element) {
        for state in status.find_all("node_state") {
            let Some(node) = self.node_name(state) else {
                self.warn(Error::missing("node_state", "uname"));
                continue;
            };
            self.membership(&node, state);
            if let Some(attrs) = state.find("transient_attributes") {
                self.transient_attributes(&node, attrs);
            }
            if let Some(lrm) = state.find("lrm") {
                self.resource_history(lrm);
            }
        }
    }

    fn membership(&mut self, node: &str, state: &Element) {
        let member = is_set(attr(state, "in_ccm"));
        let crmd = crmd_online(attr(state, "crmd"));
        let join = attr(state, "join");

        if member && crmd && join.is_none_or(|j| j == "member") {
            self.snapshot.online.insert(node.to_string());
        }
        if member && (join == Some("pending") || !crmd) {
            self.snapshot.pending.insert(node.to_string());
        }
    }

    fn transient_attributes(&mut self, node: &str, attrs: &Element) {
        for block in attrs.find_all("instance_attributes") {
            for nv in xml::nvpairs(block, self.version) {
                if let Some(key) = nv.name.strip_prefix(FAIL_COUNT_PREFIX) {
                    self.fail_count(node, key, &nv.value);
                } else if nv.name == PING_ATTRIBUTE {
                    self.snapshot.ping_metric.insert(node.to_string(), nv.value);
                }
            }
        }
    }

    /// `key` is `rsc`, `rsc:n` or either of them followed by `#op_interval`. Per-operation
    /// counts are summed into the resource's total. A clone instance's count also adds to the
    /// count of the resource it is an instance of.
    fn fail_count(&mut self, node: &str, key: &str, value: &str) {
        let rsc = key.split_once('#').map_or(key, |(rsc, _)| rsc);
        let Some(count) = FailCount::parse(value) else {
            tracing::debug!("ignoring fail count {value:?} for {rsc} on {node}");
            return;
        };

        let counts = self
            .snapshot
            .fail_counts
            .entry(node.to_string())
            .or_default();
        let mut add = |rsc: &str| {
            counts
                .entry(rsc.to_string())
                .and_modify(|c| *c = *c + count)
                .or_insert(count);
        };
        add(rsc);

        if let Some((base, index)) = split_instance(rsc) {
            add(base);
            self.snapshot
                .failed_clones
                .entry(node.to_string())
                .or_default()
                .entry(base.to_string())
                .or_default()
                .insert(index.to_string());
        }
    }

    /// Resource history may name resources that are no longer configured. Those become
    /// orphans, so that they can still be shown and cleaned up.
    fn resource_history(&mut self, lrm: &Element) {
        let Some(entries) = lrm.find("lrm_resources") else {
            return;
        };
        for entry in entries.find_all("lrm_resource") {
            let Some(id) = attr(entry, "id") else {
                continue;
            };
            if self.snapshot.resources.contains_key(id) {
                continue;
            }
            let base = split_instance(id).map(|(base, _)| base);
            if base.is_some_and(|base| self.snapshot.resources.contains_key(base)) {
                continue;
            }
            let Some(kind) = attr(entry, "type") else {
                self.warn(Error::missing(format!("lrm_resource {id}"), "type"));
                continue;
            };

            let agent = self
                .catalog
                .resolve(kind, attr(entry, "provider"), attr(entry, "class").unwrap_or("ocf"));
            if !agent.is_installed() && self.warned_agents.insert(agent.id().clone()) {
                self.warnings.push(Error::UnknownAgent(agent.id().to_string()));
            }
            tracing::debug!("{id} is in resource history but not configured");
            if let Some(base) = base {
                self.snapshot
                    .orphaned_clone_instances
                    .insert(base.to_string());
            }

            let mut orphan = ResourceInstance::new(id, ResourceKind::Primitive { agent });
            orphan.orphaned = true;
            self.snapshot.orphans.insert(id.to_string());
            self.snapshot.resource_order.push(id.to_string());
            self.snapshot.resources.insert(id.to_string(), orphan);
        }
    }
}
