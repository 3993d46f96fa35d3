//! The definition walk
//!
//! One pass over every `define` in document order. Each element declaration
//! found inside a definition is processed independently: its marker type
//! comes from its resolved name, its marker candidates from the style
//! attribute (or, with no style attribute, the type name itself as an
//! implicit marker), and every candidate merges into the running map.
//! Definitions that yield nothing are reported as skipped.

use std::collections::{BTreeSet, HashMap};

use roxmltree::{Document, Node};

use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::infer;
use crate::map::{MapBuilder, MarkerInfo, MarkerTypeInfo, PatternKey};
use crate::resolve::resolve_style_values;
use crate::schema::{
    definitions_in_order, descendants_named, index_definitions, local_attribute, resolved_name,
    scope_to_element, text_content,
};

/// Row and cell boundary markers are emitted structurally by the dialect,
/// never looked up through style values; their defines are skipped outright
const RESERVED_DEFINITIONS: [&str; 2] = ["Row", "Cell"];

/// Block-level categories; their markers begin on a new line in USFM
const BLOCK_TYPES: [&str; 7] = [
    "book", "chapter", "para", "table", "row", "sidebar", "periph",
];

/// Schema bookkeeping attributes with no USFM serialization
const BOOKKEEPING_ATTRIBUTES: [&str; 2] = ["closed", "vid"];

/// The annotation attribute carrying a per-value default-attribute hint
const DEFAULT_ATTRIBUTE_HINT: &str = "defaultAttribute";

/// Walk every definition, merging discovered markers into `builder`
///
/// Returns the names of definitions that produced no marker.
pub fn walk(
    doc: &Document,
    builder: &mut MapBuilder,
    diags: &mut Diagnostics,
) -> Result<BTreeSet<String>, CompileError> {
    let definitions = index_definitions(doc);
    let mut skipped = BTreeSet::new();

    for define in definitions_in_order(doc) {
        let name = match define.attribute("name") {
            Some(name) => name,
            None => {
                diags.warn("schema", "definition without a name, skipped");
                continue;
            }
        };
        if RESERVED_DEFINITIONS.contains(&name) {
            skipped.insert(name.to_string());
            continue;
        }

        let mut produced = false;
        for element in descendants_named(define, "element") {
            produced |= walk_element(element, name, &definitions, builder, diags)?;
        }
        if !produced {
            skipped.insert(name.to_string());
        }
    }

    Ok(skipped)
}

/// An attribute declaration owned directly by one element
struct OwnedAttribute<'a, 'input> {
    node: Node<'a, 'input>,
    name: String,
    optional: bool,
}

fn owned_attributes<'a, 'input>(
    element: Node<'a, 'input>,
    context: &str,
    diags: &mut Diagnostics,
) -> Vec<OwnedAttribute<'a, 'input>> {
    let mut owned = Vec::new();
    for node in descendants_named(element, "attribute") {
        let scope = scope_to_element(node, element);
        if !scope.owned {
            continue;
        }
        if let Some(name) = resolved_name(node, context, diags) {
            owned.push(OwnedAttribute {
                node,
                name,
                optional: scope.optional,
            });
        }
    }
    owned
}

enum CandidateKey {
    Literal(String),
    Pattern(PatternKey),
}

/// Process one element declaration; true if it yielded at least one marker
fn walk_element<'a, 'input>(
    element: Node<'a, 'input>,
    define_name: &str,
    definitions: &HashMap<String, Node<'a, 'input>>,
    builder: &mut MapBuilder,
    diags: &mut Diagnostics,
) -> Result<bool, CompileError> {
    let type_name = match resolved_name(element, define_name, diags) {
        Some(type_name) => type_name,
        None => {
            diags.warn(define_name, "element without a resolvable name, skipped");
            return Ok(false);
        }
    };
    let context = format!("{}/{}", define_name, type_name);

    let attributes = owned_attributes(element, &context, diags);
    let style_attributes: Vec<_> = attributes
        .iter()
        .filter(|a| a.name == "style")
        .map(|a| a.node)
        .collect();

    // Candidate markers, each with an optional per-candidate default hint
    let mut candidates: Vec<(CandidateKey, Option<String>)> = Vec::new();
    if style_attributes.is_empty() {
        // No discriminating attribute: the type name is the marker
        candidates.push((CandidateKey::Literal(type_name.clone()), None));
    } else {
        for style in style_attributes {
            let resolved = resolve_style_values(style, definitions, &context, diags);
            for value in resolved.values {
                let marker = text_content(value);
                if marker.is_empty() {
                    diags.warn(&context, "empty style value, skipped");
                    continue;
                }
                let hint = local_attribute(value, DEFAULT_ATTRIBUTE_HINT).map(str::to_string);
                candidates.push((CandidateKey::Literal(marker), hint));
            }
            for pattern in resolved.patterns {
                let source = text_content(pattern);
                if source.is_empty() {
                    diags.warn(&context, "empty style pattern, skipped");
                    continue;
                }
                let key = match PatternKey::new(&source) {
                    Ok(key) => key,
                    Err(e) => {
                        diags.warn(
                            &context,
                            format!("style pattern '{}' does not compile: {}", source, e),
                        );
                        continue;
                    }
                };
                let hint = local_attribute(pattern, DEFAULT_ATTRIBUTE_HINT).map(str::to_string);
                candidates.push((CandidateKey::Pattern(key), hint));
            }
        }
    }

    if candidates.is_empty() {
        return Ok(false);
    }

    // The element-level default applies to every candidate without its own
    let element_default = infer::default_attribute(element, &type_name, &context, diags);
    for (key, hint) in candidates {
        let mut info = MarkerInfo::of_type(&type_name);
        info.default_attribute = hint.or_else(|| element_default.clone());
        match key {
            CandidateKey::Literal(marker) => {
                builder.merge_marker(&marker, info, &context, diags)?;
            }
            CandidateKey::Pattern(key) => {
                builder.merge_pattern_marker(key, info, &context, diags)?;
            }
        }
    }

    let type_record = derive_marker_type(&type_name, &attributes);
    builder.merge_marker_type(&type_name, type_record, &context, diags)?;
    Ok(true)
}

/// Derive the marker-type record from the element's own attribute surface
fn derive_marker_type(type_name: &str, attributes: &[OwnedAttribute]) -> MarkerTypeInfo {
    let mut info = MarkerTypeInfo::default();

    if attributes.iter().any(|a| a.name == "style") {
        info.has_style_attribute = Some(true);
    }
    if BLOCK_TYPES.contains(&type_name) {
        info.should_have_newline_before = Some(true);
    }
    // The schema records end-marker occurrences in a 'closed' attribute;
    // its presence and optionality carry over to the closing-marker flags
    if let Some(closed) = attributes.iter().find(|a| a.name == "closed") {
        info.has_closing_marker = Some(true);
        if closed.optional {
            info.is_closing_marker_optional = Some(true);
        }
        // Milestone end markers carry no content
        if type_name == "ms" {
            info.is_closing_marker_empty = Some(true);
        }
    }

    let mut skip: Vec<String> = Vec::new();
    for attribute in attributes {
        if BOOKKEEPING_ATTRIBUTES.contains(&attribute.name.as_str())
            && !skip.contains(&attribute.name)
        {
            skip.push(attribute.name.clone());
        }
    }
    if !skip.is_empty() {
        info.skip_output_attribute_to_usfm = Some(skip);
    }

    info
}
