//! Default-attribute inference
//!
//! Default-attribute syntax is only unambiguous when there is exactly one
//! attribute to imply, so the rule is: exactly one required attribute wins;
//! with none required, the first optional one wins; anything else means no
//! default. Only attributes owned directly by the element count, and a
//! fixed exclusion table removes attributes that the dialect never writes
//! positionally.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use roxmltree::Node;

use crate::diagnostics::Diagnostics;
use crate::schema::{descendants_named, resolved_name, scope_to_element};

/// Attributes a marker type never supplies positionally
enum Exclusion {
    /// No attribute of this type can be a default
    All,
    /// One named attribute is excluded
    Attribute(&'static str),
}

/// The discriminating attribute is excluded for every type
const STYLE_ATTRIBUTE: &str = "style";

static EXCLUSIONS: Lazy<HashMap<&'static str, Exclusion>> = Lazy::new(|| {
    let mut table = HashMap::new();
    // The note caller is supplied structurally, never as a named attribute
    table.insert("note", Exclusion::All);
    // 'closed' records whether the end marker appeared; pure bookkeeping
    table.insert("char", Exclusion::Attribute("closed"));
    // 'vid' anchors paragraphs to verses in the tree form only
    table.insert("para", Exclusion::Attribute("vid"));
    table
});

fn excluded(marker_type: &str, attribute: &str) -> bool {
    if attribute == STYLE_ATTRIBUTE {
        return true;
    }
    match EXCLUSIONS.get(marker_type) {
        Some(Exclusion::All) => true,
        Some(Exclusion::Attribute(name)) => attribute == *name,
        None => false,
    }
}

/// Infer the element's default attribute, if any
///
/// Scans the attribute declarations owned directly by `element` (nested
/// elements' attributes are out of scope), applies the exclusion table for
/// `marker_type`, and classifies survivors as required or optional by
/// whether an `optional` wrapper sits between them and the element.
pub fn default_attribute(
    element: Node,
    marker_type: &str,
    context: &str,
    diags: &mut Diagnostics,
) -> Option<String> {
    let mut required_count = 0usize;
    let mut optional_count = 0usize;
    let mut first_required: Option<String> = None;
    let mut first_optional: Option<String> = None;

    for attribute in descendants_named(element, "attribute") {
        let scope = scope_to_element(attribute, element);
        if !scope.owned {
            continue;
        }
        let name = match resolved_name(attribute, context, diags) {
            Some(name) => name,
            None => continue,
        };
        if excluded(marker_type, &name) {
            continue;
        }

        if scope.optional {
            optional_count += 1;
            first_optional.get_or_insert(name);
        } else {
            required_count += 1;
            first_required.get_or_insert(name);
        }
    }

    if required_count == 1 {
        first_required
    } else if required_count == 0 && optional_count >= 1 {
        first_optional
    } else {
        None
    }
}
