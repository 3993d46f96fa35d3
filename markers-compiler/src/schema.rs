//! Node navigation helpers for the RelaxNG schema document
//!
//! Thin, side-effect-free lookups over the roxmltree DOM. Tag names are
//! compared case-insensitively and by local name only, so the RelaxNG
//! namespace and annotation namespaces never need spelling out. The one
//! stateful concern, name resolution with more than one candidate, reports
//! through the diagnostics sink.

use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::diagnostics::Diagnostics;

/// Trimmed text content of a node's whole subtree; empty string if none
pub fn text_content(node: Node) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if let Some(text) = descendant.text() {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}

/// Direct element children matching `tag` (case-insensitive), in order
pub fn children_named<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case(tag))
        .collect()
}

/// All elements matching `tag` (case-insensitive) in the node's subtree,
/// in document order, excluding the node itself
pub fn descendants_named<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    node.descendants()
        .filter(|d| *d != node && d.is_element() && d.tag_name().name().eq_ignore_ascii_case(tag))
        .collect()
}

/// An attribute value looked up by local name, ignoring any namespace
///
/// Annotation attributes (the `defaultAttribute` hint on value and pattern
/// nodes) usually come namespaced; `Node::attribute` would miss them.
pub fn local_attribute<'a>(node: Node<'a, '_>, local_name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == local_name)
        .map(|a| a.value())
}

/// Resolve the name of a schema node
///
/// The name is either a `name` attribute or the text of a child `name`
/// element. The attribute wins; with several `name` children the first wins
/// and a warning identifies `context`. Returns `None` when no non-empty
/// name can be found.
pub fn resolved_name(node: Node, context: &str, diags: &mut Diagnostics) -> Option<String> {
    if let Some(name) = node.attribute("name") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    let name_children = children_named(node, "name");
    if name_children.len() > 1 {
        diags.warn(
            context,
            format!(
                "<{}> has {} name children, using the first",
                node.tag_name().name(),
                name_children.len()
            ),
        );
    }
    let name = text_content(*name_children.first()?);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Where an attribute declaration sits relative to an element boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeScope {
    /// The nearest enclosing `element` is the expected one
    pub owned: bool,
    /// An `optional` wrapper sits between the node and that boundary
    pub optional: bool,
}

/// Walk ancestors until an `element` boundary or the root
///
/// Reports whether the boundary reached is `boundary` itself and whether an
/// `optional` wrapper was crossed on the way. Attributes of nested elements
/// report `owned = false`, which is what keeps default-attribute inference
/// scoped to one element at a time.
pub fn scope_to_element(node: Node, boundary: Node) -> AttributeScope {
    let mut optional = false;
    for ancestor in node.ancestors().skip(1) {
        if !ancestor.is_element() {
            continue;
        }
        let tag = ancestor.tag_name().name();
        if tag.eq_ignore_ascii_case("element") {
            return AttributeScope {
                owned: ancestor == boundary,
                optional,
            };
        }
        if tag.eq_ignore_ascii_case("optional") {
            optional = true;
        }
    }
    AttributeScope {
        owned: false,
        optional,
    }
}

/// All `define` elements of the document, in document order
pub fn definitions_in_order<'a, 'input>(doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
    doc.root_element()
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("define"))
        .collect()
}

/// Index of definition name → `define` node for reference resolution
///
/// A later definition with the same name shadows an earlier one, matching
/// how lookup walks the index rather than the document.
pub fn index_definitions<'a, 'input>(
    doc: &'a Document<'input>,
) -> HashMap<String, Node<'a, 'input>> {
    let mut index = HashMap::new();
    for define in definitions_in_order(doc) {
        if let Some(name) = define.attribute("name") {
            index.insert(name.to_string(), define);
        }
    }
    index
}
