// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! agent.rs
//!
//! Resource agents and the parameter schemas they expose, as described by the agents' own
//! metadata documents.

use elementtree::Element;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::xml::{self, attr, attr_string, child_text};

static INTEGER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d*|[+-]?INFINITY)$").expect("failed to compile integer regex")
});

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d*(ms|msec|us|usec|s|sec|m|min|h|hr)?$").expect("failed to compile time regex")
});

/// Canonical boolean spellings written by the cluster manager.
pub const PCMK_TRUE: &str = "true";
pub const PCMK_FALSE: &str = "false";

/// Every boolean spelling any supported cluster manager revision accepts.
const BOOLEAN_VALUES: &[&str] = &[
    "yes", "no", "true", "false", "True", "False", PCMK_TRUE, PCMK_FALSE,
];

/// The semantic type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Boolean,
    Integer,
    Time,
    String,
    /// Free text, declared in metadata as `label`. Checked like a string.
    Label,
}

impl ParamType {
    /// Map the `type` attribute of a metadata `content` element.
    pub fn from_metadata(kind: &str) -> Self {
        match kind {
            "boolean" => ParamType::Boolean,
            "integer" | "int" => ParamType::Integer,
            "time" => ParamType::Time,
            "label" => ParamType::Label,
            _ => ParamType::String,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ParamType::Boolean => "boolean",
                ParamType::Integer => "integer",
                ParamType::Time => "time",
                ParamType::String => "string",
                ParamType::Label => "label",
            }
        )
    }
}

/// Where a parameter is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Required,
    Optional,
    Meta,
    Stonith,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Section::Required => "Required",
                Section::Optional => "Optional",
                Section::Meta => "Meta Attributes",
                Section::Stonith => "Stonith Parameters",
            }
        )
    }
}

/// Check `value` against the grammar of `param_type`.
///
/// Typed values must match their grammar, whether required or not. Any other value only has to
/// be non-empty when the parameter is required.
pub fn check_param(param_type: ParamType, required: bool, value: &str) -> bool {
    match param_type {
        ParamType::Boolean => BOOLEAN_VALUES.contains(&value),
        ParamType::Integer => INTEGER_REGEX.is_match(value),
        ParamType::Time => TIME_REGEX.is_match(value),
        ParamType::String | ParamType::Label => !required || !value.is_empty(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// The name used in the configuration document.
    pub name: String,
    /// The name shown to users. Usually the same as `name`.
    pub label: String,
    pub param_type: ParamType,
    pub required: bool,
    pub unique: bool,
    pub default: Option<String>,
    pub preferred: Option<String>,
    pub choices: Vec<String>,
    /// Choices offered when the resource runs in a master/slave set.
    pub ms_choices: Vec<String>,
    pub is_meta: bool,
    pub section: Section,
    pub shortdesc: Option<String>,
    pub longdesc: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: &str, param_type: ParamType, section: Section) -> Self {
        let choices = match param_type {
            ParamType::Boolean => vec![PCMK_TRUE.to_string(), PCMK_FALSE.to_string()],
            _ => Vec::new(),
        };
        Self {
            name: name.to_string(),
            label: name.to_string(),
            param_type,
            required: section == Section::Required,
            unique: false,
            default: None,
            preferred: None,
            ms_choices: choices.clone(),
            choices,
            is_meta: section == Section::Meta,
            section,
            shortdesc: None,
            longdesc: None,
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_preferred(mut self, preferred: &str) -> Self {
        self.preferred = Some(preferred.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_shortdesc(mut self, desc: &str) -> Self {
        self.shortdesc = Some(desc.to_string());
        self
    }

    pub fn with_choices(mut self, choices: &[&str], ms_choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self.ms_choices = ms_choices.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Check a value against this parameter's type and required flag.
    pub fn check(&self, value: &str) -> bool {
        check_param(self.param_type, self.required, value)
    }

    /// The choice list to offer, depending on whether the resource is a master/slave set.
    pub fn choices_for(&self, master_slave: bool) -> &[String] {
        if master_slave {
            &self.ms_choices
        } else {
            &self.choices
        }
    }

    /// Parse one `parameter` element of a metadata document.
    fn from_metadata(elem: &Element) -> Option<Self> {
        let name = attr(elem, "name")?;
        let required = attr(elem, "required").is_some_and(xml::is_true);
        let section = if required {
            Section::Required
        } else {
            Section::Optional
        };

        let content = elem.find("content");
        let kind = content.and_then(|c| attr(c, "type")).unwrap_or("string");
        let mut param = ParameterDescriptor::new(name, ParamType::from_metadata(kind), section);
        param.unique = attr(elem, "unique").is_some_and(xml::is_true);
        param.shortdesc = child_text(elem, "shortdesc");
        param.longdesc = child_text(elem, "longdesc");

        if let Some(content) = content {
            param.default = attr_string(content, "default");
            // OCF 1.1 "select" parameters enumerate their values.
            let options: Vec<String> = content
                .find_all("option")
                .filter_map(|o| attr_string(o, "value"))
                .collect();
            if !options.is_empty() {
                param.ms_choices = options.clone();
                param.choices = options;
            }
        }

        Some(param)
    }
}

/// A resource agent identifier: standard (class), provider and type,
/// e.g. `ocf:heartbeat:IPaddr2` or `stonith:fence_ipmilan`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId {
    pub class: String,
    pub provider: Option<String>,
    pub name: String,
}

impl AgentId {
    /// Only OCF agents have providers; an OCF agent without one belongs to `heartbeat`.
    pub fn new(class: &str, provider: Option<&str>, name: &str) -> Self {
        let provider = match class {
            "ocf" => Some(provider.filter(|p| !p.is_empty()).unwrap_or("heartbeat")),
            _ => None,
        };
        Self {
            class: class.to_string(),
            provider: provider.map(str::to_string),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "{}:{}:{}", self.class, provider, self.name),
            None => write!(f, "{}:{}", self.class, self.name),
        }
    }
}

/// Default settings an agent declares for one of its actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentAction {
    pub name: String,
    pub depth: Option<String>,
    pub timeout: Option<String>,
    pub interval: Option<String>,
    pub start_delay: Option<String>,
    pub role: Option<String>,
}

impl AgentAction {
    fn from_metadata(elem: &Element) -> Option<Self> {
        Some(Self {
            name: attr_string(elem, "name")?,
            depth: attr_string(elem, "depth"),
            timeout: attr_string(elem, "timeout"),
            interval: attr_string(elem, "interval"),
            start_delay: attr_string(elem, "start-delay"),
            role: attr_string(elem, "role"),
        })
    }
}

/// What kind of resource an agent builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Primitive,
    Group,
    Clone,
}

#[derive(Debug, Clone)]
pub struct ResourceAgent {
    id: AgentId,
    kind: AgentKind,
    version: Option<String>,
    shortdesc: Option<String>,
    longdesc: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    actions: Vec<AgentAction>,
    is_master_slave: bool,
    is_installed: bool,
}

impl ResourceAgent {
    /// An agent that is referenced somewhere but whose metadata was never seen.
    pub fn placeholder(id: AgentId) -> Self {
        Self {
            id,
            kind: AgentKind::Primitive,
            version: None,
            shortdesc: None,
            longdesc: None,
            parameters: Vec::new(),
            actions: Vec::new(),
            is_master_slave: false,
            is_installed: false,
        }
    }

    /// One of the composite agents that group or clone other resources.
    pub(crate) fn composite(kind: AgentKind, parameters: Vec<ParameterDescriptor>) -> Self {
        let name = match kind {
            AgentKind::Group => "Group",
            AgentKind::Clone => "Clone",
            AgentKind::Primitive => "Primitive",
        };
        Self {
            id: AgentId::new("composite", None, name),
            kind,
            version: None,
            shortdesc: None,
            longdesc: None,
            parameters,
            actions: Vec::new(),
            is_master_slave: false,
            is_installed: true,
        }
    }

    /// Parse an agent metadata document.
    ///
    /// `master_slave_hint` marks the agent as master/slave capable even if its actions don't
    /// say so.
    pub fn from_metadata(id: AgentId, root: &Element, master_slave_hint: bool) -> Result<Self> {
        let tag = root.tag().name();
        if tag != "resource-agent" {
            return Err(Error::UnexpectedRoot {
                expected: "resource-agent".to_string(),
                found: tag.to_string(),
            });
        }

        let parameters = root
            .find("parameters")
            .map(|params| {
                params
                    .find_all("parameter")
                    .filter_map(ParameterDescriptor::from_metadata)
                    .collect()
            })
            .unwrap_or_default();

        let actions: Vec<AgentAction> = root
            .find("actions")
            .map(|actions| {
                actions
                    .find_all("action")
                    .filter_map(AgentAction::from_metadata)
                    .collect()
            })
            .unwrap_or_default();

        let promotable = ["promote", "demote"]
            .iter()
            .all(|op| actions.iter().any(|a| a.name == *op));

        let mut agent = Self {
            id,
            kind: AgentKind::Primitive,
            version: child_text(root, "version").or_else(|| attr_string(root, "version")),
            shortdesc: child_text(root, "shortdesc"),
            longdesc: child_text(root, "longdesc"),
            parameters,
            actions,
            is_master_slave: master_slave_hint || promotable,
            is_installed: true,
        };

        if agent.is_ping() {
            for param in agent.parameters.iter_mut() {
                param.param_type = ParamType::Integer;
                param.choices.clear();
                param.ms_choices.clear();
                if param.name == "host_list" {
                    param.required = true;
                    param.section = Section::Required;
                }
            }
        }

        Ok(agent)
    }

    /// Append parameters that aren't already part of the schema. A parameter the agent declares
    /// itself always wins over a synthesized one of the same name.
    pub(crate) fn append_parameters<'a, I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = &'a ParameterDescriptor>,
    {
        for param in extra {
            if self.parameter(&param.name).is_none() {
                self.parameters.push(param.clone());
            }
        }
    }

    pub(crate) fn set_master_slave(&mut self, master_slave: bool) {
        self.is_master_slave = master_slave;
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn provider(&self) -> Option<&str> {
        self.id.provider.as_deref()
    }

    pub fn class(&self) -> &str {
        &self.id.class
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn shortdesc(&self) -> Option<&str> {
        self.shortdesc.as_deref()
    }

    pub fn longdesc(&self) -> Option<&str> {
        self.longdesc.as_deref()
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.required)
    }

    pub fn actions(&self) -> &[AgentAction] {
        &self.actions
    }

    /// The defaults for an action. An entry without a role is preferred over role-specific
    /// entries such as a `monitor` for the Master role.
    pub fn action(&self, name: &str) -> Option<&AgentAction> {
        let mut matching = self.actions.iter().filter(|a| a.name == name);
        let first = matching.next()?;
        if first.role.is_none() {
            return Some(first);
        }
        matching.find(|a| a.role.is_none()).or(Some(first))
    }

    pub fn is_stonith(&self) -> bool {
        self.id.class == "stonith"
    }

    pub fn is_master_slave(&self) -> bool {
        self.is_master_slave
    }

    pub fn is_ping(&self) -> bool {
        self.id.class == "ocf" && matches!(self.id.name.as_str(), "ping" | "pingd")
    }

    pub fn is_installed(&self) -> bool {
        self.is_installed
    }

    /// Check a value for one of this agent's parameters. Unknown parameters are accepted.
    pub fn check_param(&self, name: &str, value: &str) -> bool {
        match self.parameter(name) {
            Some(param) => param.check(value),
            None => true,
        }
    }
}
