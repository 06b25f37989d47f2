// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! The static parameter tables shared by ordinary agents, groups and clones.

use crate::agent::{ParamType, ParameterDescriptor, Section};
use crate::version::VersionContext;

pub const TARGET_ROLE_STARTED: &str = "started";
pub const TARGET_ROLE_STOPPED: &str = "stopped";
pub const TARGET_ROLE_MASTER: &str = "master";
pub const TARGET_ROLE_SLAVE: &str = "slave";

/// The internal name of the stonith priority instance attribute. It is displayed as
/// "priority" but must not collide with the meta-attribute of that name.
pub const STONITH_PRIORITY: &str = "stonith-priority";
pub const STONITH_TIMEOUT: &str = "stonith-timeout";

/// Meta-attributes which only exist from heartbeat 2.1.4 on.
const STICKINESS_META: &[&str] = &["resource-stickiness", "failure-timeout"];

/// Read-only descriptor tables. Construct once with `MetaAttributeDefaults::default()` and
/// pass by reference to the catalog.
#[derive(Debug, Clone)]
pub struct MetaAttributeDefaults {
    meta: Vec<ParameterDescriptor>,
    stonith: Vec<ParameterDescriptor>,
    group: Vec<ParameterDescriptor>,
    clone: Vec<ParameterDescriptor>,
}

impl Default for MetaAttributeDefaults {
    fn default() -> Self {
        let meta = vec![
            ParameterDescriptor::new("target-role", ParamType::String, Section::Meta)
                .with_choices(
                    &[TARGET_ROLE_STARTED, TARGET_ROLE_STOPPED],
                    &[
                        TARGET_ROLE_STARTED,
                        TARGET_ROLE_STOPPED,
                        TARGET_ROLE_MASTER,
                        TARGET_ROLE_SLAVE,
                    ],
                )
                .with_preferred(TARGET_ROLE_STARTED)
                .with_shortdesc("Target Role"),
            ParameterDescriptor::new("is-managed", ParamType::Boolean, Section::Meta)
                .with_default("true")
                .with_shortdesc("Is Managed By Cluster"),
            ParameterDescriptor::new("migration-threshold", ParamType::Integer, Section::Meta)
                .with_default("INFINITY")
                .with_shortdesc("Migration Threshold"),
            ParameterDescriptor::new("priority", ParamType::Integer, Section::Meta)
                .with_default("0")
                .with_shortdesc("Priority"),
            ParameterDescriptor::new("multiple-active", ParamType::String, Section::Meta)
                .with_choices(
                    &["stop_start", "stop_only", "block"],
                    &["stop_start", "stop_only", "block"],
                )
                .with_default("stop_start")
                .with_shortdesc("Multiple Active"),
            ParameterDescriptor::new("resource-stickiness", ParamType::Integer, Section::Meta)
                .with_default("0")
                .with_shortdesc("Resource Stickiness"),
            ParameterDescriptor::new("failure-timeout", ParamType::Time, Section::Meta)
                .with_default("0")
                .with_shortdesc("Failure Timeout"),
        ];

        let stonith = vec![
            ParameterDescriptor::new(STONITH_TIMEOUT, ParamType::Time, Section::Stonith)
                .with_shortdesc("Stonith Timeout"),
            ParameterDescriptor::new(STONITH_PRIORITY, ParamType::Integer, Section::Stonith)
                .with_label("priority")
                .with_default("0")
                .with_shortdesc("Stonith Priority"),
        ];

        let group = vec![
            ParameterDescriptor::new("ordered", ParamType::Boolean, Section::Optional)
                .with_default("true"),
            ParameterDescriptor::new("collocated", ParamType::Boolean, Section::Optional)
                .with_default("true"),
        ];

        let clone = vec![
            ParameterDescriptor::new("clone-max", ParamType::Integer, Section::Optional),
            ParameterDescriptor::new("clone-node-max", ParamType::Integer, Section::Optional)
                .with_default("1"),
            ParameterDescriptor::new("notify", ParamType::Boolean, Section::Optional)
                .with_default("false"),
            ParameterDescriptor::new("globally-unique", ParamType::Boolean, Section::Optional)
                .with_default("false"),
            ParameterDescriptor::new("ordered", ParamType::Boolean, Section::Optional)
                .with_default("false"),
            ParameterDescriptor::new("interleave", ParamType::Boolean, Section::Optional)
                .with_default("false"),
            ParameterDescriptor::new("master-max", ParamType::Integer, Section::Optional)
                .with_default("1"),
            ParameterDescriptor::new("master-node-max", ParamType::Integer, Section::Optional)
                .with_default("1"),
        ];

        Self {
            meta,
            stonith,
            group,
            clone,
        }
    }
}

impl MetaAttributeDefaults {
    /// The meta-attributes available under the given schema revision.
    pub fn meta_attributes<'a>(
        &'a self,
        version: &VersionContext,
    ) -> impl Iterator<Item = &'a ParameterDescriptor> {
        let stickiness = version.has_stickiness_meta();
        self.meta
            .iter()
            .filter(move |p| stickiness || !STICKINESS_META.contains(&p.name.as_str()))
    }

    pub fn meta_attribute(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.meta.iter().find(|p| p.name == name)
    }

    pub fn stonith_parameters(&self) -> &[ParameterDescriptor] {
        &self.stonith
    }

    pub fn group_parameters(&self) -> &[ParameterDescriptor] {
        &self.group
    }

    pub fn clone_parameters(&self) -> &[ParameterDescriptor] {
        &self.clone
    }
}
