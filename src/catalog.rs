// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agent::{AgentId, AgentKind, ParameterDescriptor, ResourceAgent};
use crate::defaults::MetaAttributeDefaults;
use crate::error::{Error, Result};
use crate::version::VersionContext;
use crate::xml::{self, attr};

/// The heartbeat-class script that predates the DRBD resource agent.
pub fn drbddisk_id() -> AgentId {
    AgentId::new("heartbeat", None, "drbddisk")
}

/// The replicated-disk agent shipped by LINBIT.
pub fn linbit_drbd_id() -> AgentId {
    AgentId::new("ocf", Some("linbit"), "drbd")
}

/// AgentCatalog holds every resource agent known for one connection to a cluster.
///
/// It is filled once, from the agents' metadata documents, and is only read afterwards. Every
/// agent it hands out already carries the meta-attributes (and, for stonith agents, the extra
/// instance attributes) that the cluster manager accepts in addition to the agent's own
/// parameters.
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    version: VersionContext,
    meta: Vec<ParameterDescriptor>,
    stonith: Vec<ParameterDescriptor>,
    agents: BTreeMap<AgentId, Arc<ResourceAgent>>,
    group: Arc<ResourceAgent>,
    clone: Arc<ResourceAgent>,
}

impl AgentCatalog {
    pub fn new(version: &VersionContext, defaults: &MetaAttributeDefaults) -> Self {
        let meta: Vec<ParameterDescriptor> = defaults.meta_attributes(version).cloned().collect();

        let composite = |kind, own: &[ParameterDescriptor]| {
            let mut agent = ResourceAgent::composite(kind, own.to_vec());
            agent.append_parameters(meta.iter());
            Arc::new(agent)
        };
        let group = composite(AgentKind::Group, defaults.group_parameters());
        let clone = composite(AgentKind::Clone, defaults.clone_parameters());

        let mut catalog = Self {
            version: version.clone(),
            meta,
            stonith: defaults.stonith_parameters().to_vec(),
            agents: BTreeMap::new(),
            group,
            clone,
        };

        // These two are always available under their own names, installed or not.
        for (id, master_slave) in [(drbddisk_id(), false), (linbit_drbd_id(), true)] {
            let mut agent = ResourceAgent::placeholder(id.clone());
            agent.set_master_slave(master_slave);
            catalog.synthesize(&mut agent);
            catalog.agents.insert(id, Arc::new(agent));
        }

        catalog
    }

    pub fn version(&self) -> &VersionContext {
        &self.version
    }

    /// Parse one agent's metadata document and add the agent to the catalog, replacing any
    /// earlier definition or placeholder.
    pub fn load_agent_metadata(
        &mut self,
        name: &str,
        provider: Option<&str>,
        class: &str,
        metadata: &str,
        master_slave_hint: bool,
    ) -> Result<Arc<ResourceAgent>> {
        let id = AgentId::new(class, provider, name);
        let root = xml::parse(metadata)?;
        self.insert_metadata(id, &root, master_slave_hint)
    }

    /// Load a document holding several `resource-agent` elements, each naming its own class and
    /// provider. Agents that fail to parse are skipped with a warning.
    pub fn load_metadata_bundle(&mut self, bundle: &str) -> Result<Vec<Arc<ResourceAgent>>> {
        let root = xml::parse(bundle)?;
        let mut loaded = Vec::new();
        for elem in root.find_all("resource-agent") {
            let Some(name) = attr(elem, "name") else {
                tracing::warn!("skipping resource-agent without a name");
                continue;
            };
            let class = attr(elem, "class").unwrap_or("ocf");
            let id = AgentId::new(class, attr(elem, "provider"), name);
            let master_slave = attr(elem, "master-slave").is_some_and(xml::is_true);
            match self.insert_metadata(id.clone(), elem, master_slave) {
                Ok(agent) => loaded.push(agent),
                Err(e) => tracing::warn!("could not load metadata for {id}: {e}"),
            }
        }
        Ok(loaded)
    }

    fn insert_metadata(
        &mut self,
        id: AgentId,
        root: &elementtree::Element,
        master_slave_hint: bool,
    ) -> Result<Arc<ResourceAgent>> {
        let mut agent = ResourceAgent::from_metadata(id.clone(), root, master_slave_hint)?;
        self.synthesize(&mut agent);
        tracing::debug!(
            "loaded agent {} with {} parameters",
            id,
            agent.parameters().len()
        );
        let agent = Arc::new(agent);
        self.agents.insert(id, Arc::clone(&agent));
        Ok(agent)
    }

    fn synthesize(&self, agent: &mut ResourceAgent) {
        if agent.is_stonith() {
            agent.append_parameters(self.stonith.iter());
        }
        agent.append_parameters(self.meta.iter());
    }

    /// Look up an agent. This never fails: an agent the catalog has never seen is returned as a
    /// "not installed" placeholder that still carries the meta-attributes.
    pub fn resolve(&self, name: &str, provider: Option<&str>, class: &str) -> Arc<ResourceAgent> {
        let id = AgentId::new(class, provider, name);
        if let Some(agent) = self.agents.get(&id) {
            return Arc::clone(agent);
        }
        tracing::warn!("{}", Error::UnknownAgent(id.to_string()));
        let mut agent = ResourceAgent::placeholder(id);
        self.synthesize(&mut agent);
        Arc::new(agent)
    }

    pub fn get(&self, id: &AgentId) -> Option<&Arc<ResourceAgent>> {
        self.agents.get(id)
    }

    pub fn contains(&self, name: &str, provider: Option<&str>, class: &str) -> bool {
        self.agents.contains_key(&AgentId::new(class, provider, name))
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<ResourceAgent>> {
        self.agents.values()
    }

    pub fn group_agent(&self) -> &Arc<ResourceAgent> {
        &self.group
    }

    pub fn clone_agent(&self) -> &Arc<ResourceAgent> {
        &self.clone
    }

    pub fn meta_attributes(&self) -> &[ParameterDescriptor] {
        &self.meta
    }

    fn is_installed(&self, id: &AgentId) -> bool {
        self.agents.get(id).is_some_and(|a| a.is_installed())
    }

    pub fn has_drbddisk(&self) -> bool {
        self.is_installed(&drbddisk_id())
    }

    pub fn has_linbit_drbd(&self) -> bool {
        self.is_installed(&linbit_drbd_id())
    }

    /// Problems worth telling the user about once the catalog is loaded. None of them prevent
    /// the catalog from being used.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.has_drbddisk() {
            warnings.push(format!("{} is not installed", drbddisk_id()));
        }
        if !self.has_linbit_drbd() {
            warnings.push(format!("{} is not installed", linbit_drbd_id()));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ParamType;
    use crate::defaults::STONITH_PRIORITY;

    const DUMMY: &str = r#"<resource-agent name="Dummy">
  <version>1.0</version>
  <parameters>
    <parameter name="state"><content type="string" default="/var/run/Dummy.state"/></parameter>
    <parameter name="priority"><content type="string"/></parameter>
  </parameters>
  <actions>
    <action name="start" timeout="20s"/>
  </actions>
</resource-agent>"#;

    const FENCE: &str = r#"<resource-agent name="fence_ipmilan">
  <parameters>
    <parameter name="ipaddr" required="1"><content type="string"/></parameter>
  </parameters>
</resource-agent>"#;

    fn catalog(version: &VersionContext) -> AgentCatalog {
        AgentCatalog::new(version, &MetaAttributeDefaults::default())
    }

    #[test]
    fn meta_attributes_are_synthesized() {
        let mut catalog = catalog(&VersionContext::latest());
        let agent = catalog
            .load_agent_metadata("Dummy", Some("heartbeat"), "ocf", DUMMY, false)
            .unwrap();

        let names: Vec<&str> = agent.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[..2], ["state", "priority"]);
        assert!(names.contains(&"target-role"));
        assert!(names.contains(&"resource-stickiness"));

        // the agent's own "priority" is kept rather than replaced by the meta-attribute
        let prio = agent.parameter("priority").unwrap();
        assert!(!prio.is_meta);
        assert_eq!(prio.param_type, ParamType::String);
        assert_eq!(names.iter().filter(|n| **n == "priority").count(), 1);
    }

    #[test]
    fn old_schema_has_no_stickiness() {
        let mut catalog = catalog(&VersionContext::new(Some("2.1.3"), None));
        let agent = catalog
            .load_agent_metadata("Dummy", None, "ocf", DUMMY, false)
            .unwrap();
        assert!(agent.parameter("resource-stickiness").is_none());
        assert!(agent.parameter("failure-timeout").is_none());
        assert!(agent.parameter("migration-threshold").is_some());
    }

    #[test]
    fn stonith_extras() {
        let mut catalog = catalog(&VersionContext::latest());
        let agent = catalog
            .load_agent_metadata("fence_ipmilan", None, "stonith", FENCE, false)
            .unwrap();
        assert!(agent.is_stonith());
        let prio = agent.parameter(STONITH_PRIORITY).unwrap();
        assert_eq!(prio.label, "priority");
        assert!(agent.parameter("stonith-timeout").is_some());
        // and the meta-attribute priority is still there under its own name
        assert!(agent.parameter("priority").unwrap().is_meta);
    }

    #[test]
    fn unknown_agents_resolve_to_placeholders() {
        let catalog = catalog(&VersionContext::latest());
        let agent = catalog.resolve("Missing", None, "ocf");
        assert!(!agent.is_installed());
        assert_eq!(agent.id().to_string(), "ocf:heartbeat:Missing");
        assert!(agent.parameter("target-role").is_some());
        assert!(!catalog.contains("Missing", None, "ocf"));
    }

    #[test]
    fn special_agents() {
        let mut catalog = catalog(&VersionContext::latest());
        assert!(catalog.contains("drbddisk", None, "heartbeat"));
        assert!(!catalog.has_drbddisk());
        assert_eq!(catalog.startup_warnings().len(), 2);
        assert!(catalog.resolve("drbd", Some("linbit"), "ocf").is_master_slave());

        catalog
            .load_agent_metadata("drbd", Some("linbit"), "ocf", DUMMY, true)
            .unwrap();
        assert!(catalog.has_linbit_drbd());
        assert_eq!(catalog.startup_warnings().len(), 1);
    }

    #[test]
    fn composites() {
        let catalog = catalog(&VersionContext::latest());
        let group = catalog.group_agent();
        assert_eq!(group.kind(), AgentKind::Group);
        assert!(group.parameter("ordered").is_some());
        assert!(group.parameter("is-managed").is_some());

        let clone = catalog.clone_agent();
        for p in ["clone-max", "clone-node-max", "notify", "globally-unique", "interleave"] {
            assert!(clone.parameter(p).is_some(), "{p}");
        }
        assert!(clone.parameter("master-node-max").is_some());
    }

    #[test]
    fn bundle() {
        let mut catalog = catalog(&VersionContext::latest());
        let bundle = r#"<agents>
                 <resource-agent name="Dummy" class="ocf" provider="pacemaker">
                   <parameters/>
                 </resource-agent>
                 <resource-agent class="ocf"/>
               </agents>"#;
        let loaded = catalog.load_metadata_bundle(bundle).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(catalog.contains("Dummy", Some("pacemaker"), "ocf"));
    }

    #[test]
    fn malformed_metadata() {
        let mut catalog = catalog(&VersionContext::latest());
        let res = catalog.load_agent_metadata("x", None, "ocf", "<resource-agent", false);
        assert!(matches!(res, Err(Error::MalformedDocument(_))));
    }
}
