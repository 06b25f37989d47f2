// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Small helpers over `elementtree` shared by the metadata and configuration readers.

use elementtree::Element;

use crate::version::VersionContext;

/// A name/value pair together with the id of the `nvpair` element it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nvpair {
    pub id: Option<String>,
    pub name: String,
    pub value: String,
}

/// Parse a document from text.
pub fn parse(text: &str) -> Result<Element, elementtree::Error> {
    Element::from_reader(text.trim_start().as_bytes())
}

/// Get an attribute, treating the empty string as absent.
pub fn attr<'a>(elem: &'a Element, name: &'a str) -> Option<&'a str> {
    elem.get_attr(name).filter(|v| !v.is_empty())
}

pub fn attr_string(elem: &Element, name: &str) -> Option<String> {
    attr(elem, name).map(str::to_string)
}

/// Interpret a boolean attribute the way the cluster manager does, defaulting when absent.
pub fn attr_bool(elem: &Element, name: &str, default: bool) -> bool {
    match attr(elem, name) {
        Some(v) => is_true(v),
        None => default,
    }
}

pub fn is_true(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "on" | "1"
    )
}

/// Collect the name/value pairs of an attribute block such as `instance_attributes`.
///
/// Old schemas nest the pairs in an `attributes` element. If a wrapped schema is expected but
/// the pairs were written directly under the block, they are still accepted.
pub fn nvpairs(block: &Element, version: &VersionContext) -> Vec<Nvpair> {
    let mut elems: Vec<&Element> = Vec::new();
    if version.has_attributes_wrapper() {
        elems.extend(
            block
                .find_all("attributes")
                .flat_map(|wrapper| wrapper.find_all("nvpair")),
        );
    }
    if elems.is_empty() {
        elems.extend(block.find_all("nvpair"));
    }
    elems
        .into_iter()
        .filter_map(|nv| {
            Some(Nvpair {
                id: attr_string(nv, "id"),
                name: attr(nv, "name")?.to_string(),
                value: nv.get_attr("value").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Text content of a child element, trimmed. Empty text counts as absent.
pub fn child_text(elem: &Element, tag: &str) -> Option<String> {
    elem.find(tag)
        .map(|e| e.text().trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_and_direct_pairs() {
        let wrapped = parse(
            r#"<instance_attributes id="ia">
                 <attributes>
                   <nvpair id="ia-ip" name="ip" value="10.0.0.1"/>
                 </attributes>
               </instance_attributes>"#,
        )
        .unwrap();
        let direct = parse(
            r#"<instance_attributes id="ia">
                 <nvpair id="ia-ip" name="ip" value="10.0.0.1"/>
               </instance_attributes>"#,
        )
        .unwrap();

        let old = VersionContext::new(Some("2.1.3"), None);
        let new = VersionContext::latest();
        let expected = vec![Nvpair {
            id: Some("ia-ip".to_string()),
            name: "ip".to_string(),
            value: "10.0.0.1".to_string(),
        }];

        assert_eq!(nvpairs(&wrapped, &old), expected);
        assert_eq!(nvpairs(&direct, &old), expected);
        assert_eq!(nvpairs(&direct, &new), expected);
        // The modern schema has no wrapper, so wrapped pairs are not looked for.
        assert!(nvpairs(&wrapped, &new).is_empty());
    }

    #[test]
    fn nameless_pairs_are_skipped() {
        let block = parse(r#"<meta_attributes><nvpair id="x" value="1"/></meta_attributes>"#)
            .unwrap();
        assert!(nvpairs(&block, &VersionContext::latest()).is_empty());
    }
}
