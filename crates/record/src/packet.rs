//! Packet - the parsed tree of one log record
//!
//! A record looks like:
//!
//! ```text
//! <dm_log_packet>
//!     <pair key="type_id">LTE_RRC_OTA_Packet</pair>
//!     <pair key="timestamp">2020-01-01 00:00:00.000500</pair>
//!     <pair key="Subpackets" type="list"> … </pair>
//! </dm_log_packet>
//! ```
//!
//! Top-level `<pair>` children carry scalar fields keyed by their `key`
//! attribute; nested `list`/`dict` structures carry per-PDU detail. The
//! accessors here cover the scalar layer; the free functions below walk the
//! nested layer.

use std::borrow::Cow;

use xmltree::{Element, XMLNode};

use crate::RecordError;

/// Parsed tree of a single `<dm_log_packet>` record, owned by the extractor
/// that parsed it and moved into whichever action consumes it.
#[derive(Debug)]
pub struct Packet {
    root: Element,
}

impl Packet {
    /// Parse one record string.
    ///
    /// The splitter is purely lexical, so this is where malformed input
    /// actually surfaces.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let root = Element::parse(text.as_bytes())?;
        if root.name != "dm_log_packet" {
            return Err(RecordError::UnexpectedRoot(root.name));
        }
        Ok(Self { root })
    }

    /// The packet root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Text of the first top-level `<pair key="...">` with the given key.
    pub fn pair(&self, key: &str) -> Option<Cow<'_, str>> {
        self.pairs()
            .find(|(k, _)| *k == key)
            .and_then(|(_, el)| el.get_text())
    }

    /// Iterate over top-level `<pair>` children as `(key, element)`.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.root
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|el| el.name == "pair")
            .filter_map(|el| el.attributes.get("key").map(|k| (k.as_str(), el)))
    }

    /// The `type_id` field, empty when absent.
    pub fn type_id(&self) -> String {
        self.pair("type_id").map(Cow::into_owned).unwrap_or_default()
    }

    /// The raw `timestamp` field, or the `"timestamp N/A"` placeholder the
    /// output format uses when a packet carries none.
    pub fn timestamp_display(&self) -> String {
        self.pair("timestamp")
            .map(Cow::into_owned)
            .unwrap_or_else(|| "timestamp N/A".to_string())
    }
}

/// Text content of an element, empty when it has none.
pub fn element_text(el: &Element) -> String {
    el.get_text().map(Cow::into_owned).unwrap_or_default()
}

/// Iterate over the direct child elements, skipping text and other nodes.
pub fn child_elements(el: &Element) -> impl Iterator<Item = &Element> {
    el.children.iter().filter_map(XMLNode::as_element)
}

/// Whether the element itself carries `name="value"` among its attributes.
pub fn has_attr(el: &Element, name: &str, value: &str) -> bool {
    el.attributes.get(name).is_some_and(|v| v == value)
}

/// Collect every element in the tree (root included) carrying `name="value"`.
///
/// Matched elements are still descended into, so a returned node may be a
/// descendant of another returned node.
pub fn subtrees_with_attr<'a>(root: &'a Element, name: &str, value: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_subtrees(root, name, value, false, &mut found);
    found
}

/// Like [`subtrees_with_attr`], but matched elements are not descended into,
/// so all returned nodes are disjoint.
pub fn disjoint_subtrees_with_attr<'a>(
    root: &'a Element,
    name: &str,
    value: &str,
) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_subtrees(root, name, value, true, &mut found);
    found
}

/// Whether any element in the tree carries `name="value"`.
pub fn has_subtree_with_attr(root: &Element, name: &str, value: &str) -> bool {
    if has_attr(root, name, value) {
        return true;
    }
    root.children
        .iter()
        .filter_map(XMLNode::as_element)
        .any(|child| has_subtree_with_attr(child, name, value))
}

fn collect_subtrees<'a>(
    el: &'a Element,
    name: &str,
    value: &str,
    disjoint: bool,
    found: &mut Vec<&'a Element>,
) {
    if has_attr(el, name, value) {
        found.push(el);
        if disjoint {
            return;
        }
    }
    for child in el.children.iter().filter_map(XMLNode::as_element) {
        collect_subtrees(child, name, value, disjoint, found);
    }
}

#[cfg(test)]
#[path = "packet_test.rs"]
mod tests;
