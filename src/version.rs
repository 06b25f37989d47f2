// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! version.rs
//!
//! Every decision that depends on which revision of the cluster manager produced a document
//! lives here. The rest of the crate asks a `VersionContext` questions and never compares
//! version strings itself.

use std::cmp::Ordering;
use std::fmt;

/// One dot-separated component of a version string.
///
/// A component such as `0rc2` is a release candidate of `0`, so it sorts before a plain `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum VerPart {
    Int { n: u32, rc: Option<u32> },
    Str(String),
}

impl Ord for VerPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VerPart::Int { n: a, rc: ra }, VerPart::Int { n: b, rc: rb }) => {
                a.cmp(b).then_with(|| match (ra, rb) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(x), Some(y)) => x.cmp(y),
                })
            }
            (VerPart::Int { .. }, VerPart::Str(_)) => Ordering::Greater,
            (VerPart::Str(_), VerPart::Int { .. }) => Ordering::Less,
            (VerPart::Str(s), VerPart::Str(o)) => s.cmp(o),
        }
    }
}

impl PartialOrd for VerPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for VerPart {
    fn from(part: &str) -> Self {
        if let Ok(n) = part.parse::<u32>() {
            return VerPart::Int { n, rc: None };
        }
        if let Some((n, rc)) = part.split_once("rc") {
            if let (Ok(n), Ok(rc)) = (n.parse::<u32>(), rc.parse::<u32>()) {
                return VerPart::Int { n, rc: Some(rc) };
            }
        }
        VerPart::Str(part.to_string())
    }
}

/// A dotted version such as `2.1.4`, `1.1.0rc2` or `1.0.5-1.el6`.
///
/// Anything after the first `-` is a release and is ignored for comparison. Missing trailing
/// components compare as zero, so `1.0` equals `1.0.0`.
#[derive(Debug, Clone)]
pub struct Version {
    version: String,
    parts: Vec<VerPart>,
}

impl From<&str> for Version {
    fn from(version: &str) -> Self {
        let trimmed = version.trim();
        let base = trimmed.split('-').next().unwrap_or_default();
        Version {
            version: trimmed.to_string(),
            parts: base
                .split('.')
                .filter(|p| !p.is_empty())
                .map(VerPart::from)
                .collect(),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let zero = VerPart::Int { n: 0, rc: None };
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).unwrap_or(&zero);
            let b = other.parts.get(i).unwrap_or(&zero);
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

/// Global property names which heartbeat 2.1.4 and older spelled with underscores.
const LEGACY_PROPERTY_NAMES: &[&str] = &[
    "symmetric-cluster",
    "stonith-enabled",
    "stonith-action",
    "no-quorum-policy",
    "default-resource-stickiness",
    "default-resource-failure-stickiness",
    "is-managed-default",
    "cluster-delay",
    "stop-orphan-resources",
    "stop-orphan-actions",
    "remove-after-stop",
    "pe-error-series-max",
    "pe-warn-series-max",
    "pe-input-series-max",
    "startup-fencing",
    "start-failure-is-fatal",
    "dc-deadtime",
    "cluster-recheck-interval",
    "election-timeout",
    "shutdown-escalation",
];

/// Attribute names used by an order constraint in a particular schema revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAttributes {
    pub first: &'static str,
    pub then: &'static str,
    pub first_action: &'static str,
    pub then_action: &'static str,
}

/// Attribute names used by a colocation constraint in a particular schema revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColocationAttributes {
    pub rsc: &'static str,
    pub with_rsc: &'static str,
    pub rsc_role: &'static str,
    pub with_rsc_role: &'static str,
}

/// The pair of versions a document was produced by. Either may be unknown, which is common;
/// when nothing is known the newest schema is assumed.
#[derive(Debug, Clone, Default)]
pub struct VersionContext {
    heartbeat: Option<Version>,
    pacemaker: Option<Version>,
}

impl VersionContext {
    pub fn new(heartbeat: Option<&str>, pacemaker: Option<&str>) -> Self {
        let parse = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(Version::from)
        };
        Self {
            heartbeat: parse(heartbeat),
            pacemaker: parse(pacemaker),
        }
    }

    /// The context used when no version information is available at all.
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn heartbeat(&self) -> Option<&Version> {
        self.heartbeat.as_ref()
    }

    pub fn pacemaker(&self) -> Option<&Version> {
        self.pacemaker.as_ref()
    }

    /// The heartbeat version that should gate legacy behaviour. A known pacemaker version always
    /// means the modern schema, so in that case there is nothing legacy to consider.
    fn legacy_heartbeat(&self) -> Option<&Version> {
        match self.pacemaker {
            Some(_) => None,
            None => self.heartbeat.as_ref(),
        }
    }

    fn heartbeat_below(&self, floor: &str) -> bool {
        self.legacy_heartbeat()
            .is_some_and(|hb| *hb < Version::from(floor))
    }

    fn heartbeat_at_most(&self, ceiling: &str) -> bool {
        self.legacy_heartbeat()
            .is_some_and(|hb| *hb <= Version::from(ceiling))
    }

    /// Pre-2.99 schemas wrap name/value pairs in an extra `attributes` element.
    pub fn has_attributes_wrapper(&self) -> bool {
        self.heartbeat_below("2.99.0")
    }

    /// Schemas at or below 2.1.4 may spell global property names with underscores.
    pub fn uses_legacy_property_names(&self) -> bool {
        self.heartbeat_at_most("2.1.4")
    }

    /// Whether `rsc_defaults` and `op_defaults` exist at all.
    pub fn has_defaults_sections(&self) -> bool {
        !self.heartbeat_below("2.99.0")
    }

    /// Whether the `resource-stickiness` and `failure-timeout` meta-attributes exist.
    pub fn has_stickiness_meta(&self) -> bool {
        !self.heartbeat_below("2.1.4")
    }

    /// Whether constraints use the heartbeat-era `from`/`to` vocabulary.
    pub fn has_legacy_constraint_attributes(&self) -> bool {
        self.heartbeat_below("2.99.0")
    }

    /// Map a global property name as found in a document onto its canonical hyphenated
    /// spelling.
    pub fn canonical_property_name(&self, name: &str) -> String {
        if self.uses_legacy_property_names() {
            let hyphenated = name.replace('_', "-");
            if LEGACY_PROPERTY_NAMES.contains(&hyphenated.as_str()) {
                return hyphenated;
            }
        }
        name.to_string()
    }

    /// The spelling a property should be written with for this schema revision.
    pub fn document_property_name(&self, canonical: &str) -> String {
        if self.uses_legacy_property_names() && LEGACY_PROPERTY_NAMES.contains(&canonical) {
            canonical.replace('-', "_")
        } else {
            canonical.to_string()
        }
    }

    pub fn order_attributes(&self) -> OrderAttributes {
        if self.has_legacy_constraint_attributes() {
            // "from X type=after to Y" means Y is first.
            OrderAttributes {
                first: "to",
                then: "from",
                first_action: "to_action",
                then_action: "action",
            }
        } else {
            OrderAttributes {
                first: "first",
                then: "then",
                first_action: "first-action",
                then_action: "then-action",
            }
        }
    }

    pub fn colocation_attributes(&self) -> ColocationAttributes {
        if self.has_legacy_constraint_attributes() {
            ColocationAttributes {
                rsc: "from",
                with_rsc: "to",
                rsc_role: "from_role",
                with_rsc_role: "to_role",
            }
        } else {
            ColocationAttributes {
                rsc: "rsc",
                with_rsc: "with-rsc",
                rsc_role: "rsc-role",
                with_rsc_role: "with-rsc-role",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Version, VersionContext};

    #[test]
    fn version_cmp() {
        assert!(Version::from("2.1.4") > Version::from("2.1.3"));
        assert!(Version::from("2.99.0") > Version::from("2.1.4"));
        assert!(Version::from("1.0") == Version::from("1.0.0"));
        assert!(Version::from("1.0.5-1.el6") == Version::from("1.0.5"));
        assert!(Version::from("10.0") > Version::from("9.9"));
    }

    #[test]
    fn release_candidates_sort_first() {
        assert!(Version::from("1.1.0rc2") < Version::from("1.1.0"));
        assert!(Version::from("1.1.0rc2") > Version::from("1.1.0rc1"));
        assert!(Version::from("1.1.0rc2") > Version::from("1.0.9"));
        assert!(Version::from("2.99.0rc1") < Version::from("2.99.0"));
    }

    #[test]
    fn unknown_versions_mean_latest() {
        let ctx = VersionContext::latest();
        assert!(!ctx.has_attributes_wrapper());
        assert!(!ctx.uses_legacy_property_names());
        assert!(ctx.has_defaults_sections());
        assert!(ctx.has_stickiness_meta());
        assert_eq!(ctx.order_attributes().first, "first");
        assert_eq!(ctx.canonical_property_name("no_quorum_policy"), "no_quorum_policy");
    }

    #[test]
    fn old_heartbeat() {
        let ctx = VersionContext::new(Some("2.1.3"), None);
        assert!(ctx.has_attributes_wrapper());
        assert!(ctx.uses_legacy_property_names());
        assert!(!ctx.has_defaults_sections());
        assert!(!ctx.has_stickiness_meta());
        assert_eq!(ctx.canonical_property_name("no_quorum_policy"), "no-quorum-policy");
        assert_eq!(ctx.canonical_property_name("no-quorum-policy"), "no-quorum-policy");
        assert_eq!(ctx.canonical_property_name("my_custom_prop"), "my_custom_prop");
        assert_eq!(ctx.document_property_name("stonith-enabled"), "stonith_enabled");
        assert_eq!(ctx.colocation_attributes().with_rsc, "to");
    }

    #[test]
    fn heartbeat_2_1_4_boundary() {
        let ctx = VersionContext::new(Some("2.1.4"), None);
        assert!(ctx.uses_legacy_property_names());
        assert!(ctx.has_stickiness_meta());
        assert!(ctx.has_attributes_wrapper());
    }

    #[test]
    fn pacemaker_overrides_heartbeat() {
        let ctx = VersionContext::new(Some("2.1.3"), Some("1.0.5"));
        assert!(!ctx.has_attributes_wrapper());
        assert!(ctx.has_defaults_sections());
        assert_eq!(ctx.order_attributes().then_action, "then-action");
    }

    #[test]
    fn blank_versions_are_unknown() {
        let ctx = VersionContext::new(Some("  "), Some(""));
        assert!(ctx.heartbeat().is_none());
        assert!(ctx.pacemaker().is_none());
    }
}
