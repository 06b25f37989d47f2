// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Reader for the resource status document written by `crm_mon --as-xml`.

use std::collections::{BTreeMap, BTreeSet};

use elementtree::Element;

use crate::error::{Error, Result};
use crate::xml::{self, attr, attr_bool, attr_string};

/// The role a resource is reported in.
///
/// The ordering ranks roles from "worst" to "best". A group is only as active as its least
/// active member; a clone is as active as its most active instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    #[default]
    Unknown,
    Stopped,
    Started,
    Slave,
    Master,
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role.to_ascii_lowercase().as_str() {
            "stopped" => Role::Stopped,
            "started" => Role::Started,
            "slave" | "unpromoted" => Role::Slave,
            "master" | "promoted" => Role::Master,
            _ => Role::Unknown,
        }
    }
}

impl Role {
    /// The worst of a list of roles. An empty list is pessimistically `Unknown`.
    pub fn get_worst<L>(list: L) -> Self
    where
        L: Iterator<Item = Role>,
    {
        list.min().unwrap_or(Self::Unknown)
    }

    pub fn get_best<L>(list: L) -> Self
    where
        L: Iterator<Item = Role>,
    {
        list.max().unwrap_or(Self::Unknown)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Role::Started | Role::Slave | Role::Master)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub role: Role,
    pub running_on: BTreeSet<String>,
    pub master_on: BTreeSet<String>,
    pub slave_on: BTreeSet<String>,
    pub managed: bool,
    pub failed: bool,
}

impl Default for ResourceStatus {
    fn default() -> Self {
        Self {
            role: Role::Unknown,
            running_on: BTreeSet::new(),
            master_on: BTreeSet::new(),
            slave_on: BTreeSet::new(),
            managed: true,
            failed: false,
        }
    }
}

impl ResourceStatus {
    pub fn is_running(&self) -> bool {
        !self.running_on.is_empty()
    }

    fn add_node(&mut self, node: String, role: Role) {
        match role {
            Role::Master => {
                self.master_on.insert(node.clone());
            }
            Role::Slave => {
                self.slave_on.insert(node.clone());
            }
            _ => {}
        }
        if role.is_active() {
            self.running_on.insert(node);
        }
    }

    /// Fold another report for the same resource (e.g. another clone instance) into this one.
    fn merge(&mut self, other: &ResourceStatus, role: Role) {
        self.role = role;
        self.running_on.extend(other.running_on.iter().cloned());
        self.master_on.extend(other.master_on.iter().cloned());
        self.slave_on.extend(other.slave_on.iter().cloned());
        self.managed &= other.managed;
        self.failed |= other.failed;
    }

    fn combine(elem: &Element, members: &[ResourceStatus], role: Role) -> Self {
        let mut status = ResourceStatus {
            managed: attr_bool(elem, "managed", true),
            failed: attr_bool(elem, "failed", false),
            ..Default::default()
        };
        for member in members {
            status.merge(member, role);
        }
        status.role = role;
        status
    }
}

/// Status of every resource in one status document, keyed by resource id. Groups and clones
/// get an entry of their own that summarizes their members.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    resources: BTreeMap<String, ResourceStatus>,
}

impl StatusReport {
    pub fn parse(text: &str) -> Result<Self> {
        let root = xml::parse(text)?;
        let tag = root.tag().name();
        if tag != "crm_mon" && tag != "pacemaker-result" {
            return Err(Error::UnexpectedRoot {
                expected: "crm_mon".to_string(),
                found: tag.to_string(),
            });
        }

        let mut report = StatusReport::default();
        match root.find("resources") {
            Some(resources) => {
                for elem in resources.children() {
                    report.read(elem);
                }
            }
            None => tracing::debug!("status document has no resources"),
        }
        Ok(report)
    }

    fn read(&mut self, elem: &Element) -> Option<ResourceStatus> {
        let id = attr_string(elem, "id")?;
        let status = match elem.tag().name() {
            "resource" => {
                let role = Role::from(attr(elem, "role").unwrap_or_default());
                let mut status = ResourceStatus {
                    role,
                    managed: attr_bool(elem, "managed", true),
                    failed: attr_bool(elem, "failed", false),
                    ..Default::default()
                };
                for node in elem.find_all("node").filter_map(|n| attr_string(n, "name")) {
                    status.add_node(node, role);
                }
                status
            }
            "group" => {
                let members: Vec<ResourceStatus> =
                    elem.children().filter_map(|c| self.read(c)).collect();
                let role = Role::get_worst(members.iter().map(|m| m.role));
                ResourceStatus::combine(elem, &members, role)
            }
            "clone" => {
                let members: Vec<ResourceStatus> =
                    elem.children().filter_map(|c| self.read(c)).collect();
                let role = Role::get_best(members.iter().map(|m| m.role));
                ResourceStatus::combine(elem, &members, role)
            }
            other => {
                tracing::warn!("unknown resource tag <{other}> in status");
                return None;
            }
        };

        match self.resources.get_mut(&id) {
            Some(existing) => {
                let role = existing.role.max(status.role);
                existing.merge(&status, role);
            }
            None => {
                self.resources.insert(id, status.clone());
            }
        }
        Some(status)
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceStatus> {
        self.resources.get(id)
    }

    pub fn resources(&self) -> &BTreeMap<String, ResourceStatus> {
        &self.resources
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.resources.get(id).is_some_and(ResourceStatus::is_running)
    }

    pub fn is_managed(&self, id: &str) -> bool {
        self.resources.get(id).is_none_or(|s| s.managed)
    }

    pub fn running_on(&self, id: &str) -> Vec<&str> {
        self.resources
            .get(id)
            .map(|s| s.running_on.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRM_MON: &str = r#"<?xml version="1.0"?>
<crm_mon version="2.0.5">
  <resources>
    <resource id="ip" resource_agent="ocf::heartbeat:IPaddr2" role="Started" active="true" managed="true" failed="false" nodes_running_on="1">
      <node name="node1" id="1" cached="true"/>
    </resource>
    <resource id="fs" resource_agent="ocf::heartbeat:Filesystem" role="Stopped" active="false" managed="false" failed="false" nodes_running_on="0"/>
    <group id="grp" number_resources="2">
      <resource id="a" role="Started" managed="true"><node name="node2"/></resource>
      <resource id="b" role="Stopped" managed="true"/>
    </group>
    <clone id="ms-drbd" multi_state="true" unique="false" managed="true" failed="false">
      <resource id="drbd" role="Master" managed="true"><node name="node1"/></resource>
      <resource id="drbd" role="Slave" managed="true"><node name="node2"/></resource>
    </clone>
    <bundle id="b1"/>
  </resources>
</crm_mon>
"#;

    #[test]
    fn test_get_worst() {
        assert_eq!(
            Role::get_worst(vec![Role::Unknown, Role::Started].into_iter()),
            Role::Unknown
        );
        assert_eq!(Role::get_worst(vec![].into_iter()), Role::Unknown);
        assert_eq!(
            Role::get_worst(vec![Role::Master, Role::Started].into_iter()),
            Role::Started
        );
        assert_eq!(Role::from("Promoted"), Role::Master);
    }

    #[test]
    fn primitives() {
        let report = StatusReport::parse(CRM_MON).unwrap();
        assert!(report.is_running("ip"));
        assert_eq!(report.running_on("ip"), ["node1"]);
        assert!(!report.is_running("fs"));
        assert!(!report.is_managed("fs"));
        assert!(report.is_managed("unknown"));
        assert!(report.resource("b1").is_none());
    }

    #[test]
    fn groups_take_the_worst_member() {
        let report = StatusReport::parse(CRM_MON).unwrap();
        let grp = report.resource("grp").unwrap();
        assert_eq!(grp.role, Role::Stopped);
        assert_eq!(report.running_on("grp"), ["node2"]);
        assert!(report.is_running("a"));
    }

    #[test]
    fn clones_collect_instances() {
        let report = StatusReport::parse(CRM_MON).unwrap();
        let ms = report.resource("ms-drbd").unwrap();
        assert_eq!(ms.role, Role::Master);
        assert_eq!(ms.master_on.iter().collect::<Vec<_>>(), ["node1"]);
        assert_eq!(ms.slave_on.iter().collect::<Vec<_>>(), ["node2"]);

        let drbd = report.resource("drbd").unwrap();
        assert_eq!(drbd.role, Role::Master);
        assert_eq!(report.running_on("drbd"), ["node1", "node2"]);
    }

    #[test]
    fn wrong_document() {
        assert!(matches!(
            StatusReport::parse("<cib/>"),
            Err(Error::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            StatusReport::parse("<crm_mon"),
            Err(Error::MalformedDocument(_))
        ));
    }
}
