// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::BTreeMap;

use elementtree::Element;

use super::{SharedBlock, Walk};
use crate::error::Error;
use crate::resource::{Operation, ResourceInstance, ResourceKind};
use crate::xml::{self, attr, attr_string, Nvpair};

/// Heartbeat-era spelling of a group meta-attribute.
const LEGACY_GROUP_META: &[(&str, &str)] = &[("is_managed", "is-managed")];

fn is_member_tag(elem: &Element) -> bool {
    matches!(elem.tag().name(), "primitive" | "group")
}

fn insert_param(res: &mut ResourceInstance, nv: Nvpair) {
    if let Some(id) = nv.id {
        res.param_ids.insert(nv.name.clone(), id);
    }
    res.parameters.insert(nv.name, nv.value);
}

impl Walk<'_> {
    pub(super) fn resources(&mut self, resources: &Element) {
        for child in resources.children() {
            self.resource(child, None);
        }
    }

    /// Read one resource and everything below it. Returns its id if it was added.
    fn resource(&mut self, elem: &Element, parent: Option<&str>) -> Option<String> {
        match elem.tag().name() {
            "primitive" => self.primitive(elem, parent),
            "group" => self.group(elem, parent),
            "clone" | "master" => self.clone_set(elem, parent),
            other => {
                tracing::debug!("skipping <{other}> in resources");
                None
            }
        }
    }

    fn resource_id(&mut self, elem: &Element) -> Option<String> {
        let Some(id) = attr_string(elem, "id") else {
            self.warn(Error::missing(elem.tag().name(), "id"));
            return None;
        };
        if self.snapshot.resource_order.contains(&id) {
            tracing::warn!("duplicate resource id {id}, keeping the first definition");
            return None;
        }
        Some(id)
    }

    fn primitive(&mut self, elem: &Element, parent: Option<&str>) -> Option<String> {
        let id = self.resource_id(elem)?;
        let Some(kind) = attr(elem, "type") else {
            self.warn(Error::missing(format!("primitive {id}"), "type"));
            return None;
        };
        self.snapshot.resource_order.push(id.clone());

        let agent = self
            .catalog
            .resolve(kind, attr(elem, "provider"), attr(elem, "class").unwrap_or("ocf"));
        if !agent.is_installed() && self.warned_agents.insert(agent.id().clone()) {
            self.warnings.push(Error::UnknownAgent(agent.id().to_string()));
        }

        let mut res = ResourceInstance::new(&id, ResourceKind::Primitive { agent });
        res.parent = parent.map(str::to_string);
        self.attributes(elem, &mut res, &[]);
        self.operations(elem, &mut res);
        self.snapshot.resources.insert(id.clone(), res);
        Some(id)
    }

    fn group(&mut self, elem: &Element, parent: Option<&str>) -> Option<String> {
        let id = self.resource_id(elem)?;
        self.snapshot.resource_order.push(id.clone());

        let mut res = ResourceInstance::new(&id, ResourceKind::Group { members: Vec::new() });
        res.parent = parent.map(str::to_string);
        self.attributes(elem, &mut res, LEGACY_GROUP_META);

        let mut members = Vec::new();
        for child in elem.children().filter(|c| is_member_tag(c)) {
            if let Some(member) = self.resource(child, Some(&id)) {
                members.push(member);
            }
        }
        res.kind = ResourceKind::Group {
            members: members.clone(),
        };
        self.snapshot.groups_to_resources.insert(id.clone(), members);
        self.snapshot.resources.insert(id.clone(), res);
        Some(id)
    }

    /// A `clone` or `master` element wrapping exactly one primitive or group.
    fn clone_set(&mut self, elem: &Element, parent: Option<&str>) -> Option<String> {
        let id = self.resource_id(elem)?;
        self.snapshot.resource_order.push(id.clone());

        let mut res = ResourceInstance::new(
            &id,
            ResourceKind::Clone {
                inner: None,
                master: false,
            },
        );
        res.parent = parent.map(str::to_string);
        self.attributes(elem, &mut res, &[]);
        let master = elem.tag().name() == "master"
            || res.parameter("promotable").is_some_and(xml::is_true);

        let mut children = elem.children().filter(|c| is_member_tag(c));
        let inner = children.next().and_then(|child| self.resource(child, Some(&id)));
        if children.next().is_some() {
            tracing::warn!("clone {id} has more than one child, only the first is used");
        }

        if let Some(inner) = &inner {
            self.snapshot
                .clone_to_resource
                .insert(id.clone(), inner.clone());
        }
        if master {
            self.snapshot.masters.insert(id.clone());
        }
        res.kind = ResourceKind::Clone { inner, master };
        self.snapshot.resources.insert(id.clone(), res);
        Some(id)
    }

    /// Read instance and meta attribute blocks. Meta-attribute blocks given by `id-ref` are
    /// queued and merged in later by `resolve_refs`.
    fn attributes(
        &mut self,
        elem: &Element,
        res: &mut ResourceInstance,
        renames: &[(&str, &str)],
    ) {
        for block in elem.find_all("instance_attributes") {
            if res.instance_attrs_id.is_none() {
                res.instance_attrs_id = attr_string(block, "id");
            }
            for nv in xml::nvpairs(block, self.version) {
                insert_param(res, nv);
            }
        }

        for block in elem.find_all("meta_attributes") {
            if let Some(target) = attr_string(block, "id-ref") {
                self.meta_refs.push((res.id.clone(), target));
                continue;
            }
            let block_id = attr_string(block, "id");
            if res.meta_attrs_id.is_none() {
                res.meta_attrs_id = block_id.clone();
            }

            let mut pairs = xml::nvpairs(block, self.version);
            for nv in pairs.iter_mut() {
                if let Some((_, canonical)) = renames.iter().find(|(old, _)| *old == nv.name) {
                    nv.name = canonical.to_string();
                }
            }
            if let Some(block_id) = block_id {
                self.meta_blocks.insert(
                    block_id,
                    SharedBlock {
                        owner: res.id.clone(),
                        content: pairs.clone(),
                    },
                );
            }
            for nv in pairs {
                insert_param(res, nv);
            }
        }
    }

    fn operations(&mut self, elem: &Element, res: &mut ResourceInstance) {
        let Some(ops) = elem.find("operations") else {
            return;
        };
        if let Some(target) = attr_string(ops, "id-ref") {
            self.op_refs.push((res.id.clone(), target));
            return;
        }

        let table = self.operation_table(ops);
        res.operations_id = attr_string(ops, "id");
        if let Some(block_id) = &res.operations_id {
            self.op_blocks.insert(
                block_id.clone(),
                SharedBlock {
                    owner: res.id.clone(),
                    content: table.clone(),
                },
            );
        }
        res.operations = table;
    }

    fn operation_table(&self, ops: &Element) -> BTreeMap<String, Operation> {
        let mut table = BTreeMap::new();
        for op in ops.find_all("op") {
            let Some(name) = attr(op, "name") else {
                continue;
            };
            let mut operation = Operation {
                id: attr_string(op, "id"),
                attributes: BTreeMap::new(),
            };
            for (qname, value) in op.attrs() {
                if !matches!(qname.name(), "id" | "name") {
                    operation
                        .attributes
                        .insert(qname.name().to_string(), value.to_string());
                }
            }
            for block in op.find_all("instance_attributes") {
                for nv in xml::nvpairs(block, self.version) {
                    operation.attributes.insert(nv.name, nv.value);
                }
            }

            let key = if table.contains_key(name) {
                let qualifier = operation
                    .get("role")
                    .or_else(|| operation.get("interval"))
                    .map(str::to_string)
                    .unwrap_or_else(|| table.len().to_string());
                format!("{name}:{qualifier}")
            } else {
                name.to_string()
            };
            table.insert(key, operation);
        }
        table
    }

    /// Merge the blocks that resources refer to by `id-ref`. A resource's own values win.
    pub(super) fn resolve_refs(&mut self) {
        for (rsc, target) in std::mem::take(&mut self.meta_refs) {
            match self.meta_blocks.get(&target) {
                Some(block) => {
                    if let Some(res) = self.snapshot.resources.get_mut(&rsc) {
                        for nv in &block.content {
                            if !res.parameters.contains_key(&nv.name) {
                                res.parameters.insert(nv.name.clone(), nv.value.clone());
                            }
                        }
                    }
                    self.snapshot
                        .meta_attrs_refs
                        .insert(rsc, block.owner.clone());
                }
                None => self.warn(Error::UnresolvedReference {
                    resource: rsc,
                    kind: "meta_attributes",
                    target,
                }),
            }
        }

        for (rsc, target) in std::mem::take(&mut self.op_refs) {
            match self.op_blocks.get(&target) {
                Some(block) => {
                    if let Some(res) = self.snapshot.resources.get_mut(&rsc) {
                        for (name, op) in &block.content {
                            res.operations
                                .entry(name.clone())
                                .or_insert_with(|| op.clone());
                        }
                    }
                    self.snapshot
                        .operations_refs
                        .insert(rsc, block.owner.clone());
                }
                None => self.warn(Error::UnresolvedReference {
                    resource: rsc,
                    kind: "operations",
                    target,
                }),
            }
        }
    }
}
