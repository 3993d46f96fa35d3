//! Reference resolution for style attribute declarations
//!
//! A style attribute rarely lists all its values inline; most sit behind
//! `ref` indirection into named definitions, which may themselves refer
//! onwards. The resolver expands the indirection breadth-first over a
//! deduplicated worklist so every definition contributes its values and
//! references exactly once, even through reference cycles.

use std::collections::{HashMap, HashSet};

use roxmltree::Node;

use crate::diagnostics::Diagnostics;
use crate::schema::descendants_named;

/// Literal value nodes and pattern nodes gathered for one style attribute
#[derive(Debug, Default)]
pub struct StyleValues<'a, 'input> {
    pub values: Vec<Node<'a, 'input>>,
    pub patterns: Vec<Node<'a, 'input>>,
}

impl StyleValues<'_, '_> {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.patterns.is_empty()
    }
}

/// Pattern-bearing `param` children carry `name="pattern"`
fn pattern_params<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    descendants_named(node, "param")
        .into_iter()
        .filter(|p| {
            p.attribute("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("pattern"))
        })
        .collect()
}

fn referenced_names(node: Node) -> Vec<String> {
    descendants_named(node, "ref")
        .into_iter()
        .filter_map(|r| r.attribute("name"))
        .map(str::to_string)
        .collect()
}

/// Expand a style attribute into its full value and pattern node lists
///
/// `definitions` is the document-wide define index; `context` labels the
/// attribute's location in diagnostics. An unresolvable reference warns and
/// is skipped; an attribute that yields nothing at all warns too, and the
/// caller drops its contribution.
pub fn resolve_style_values<'a, 'input>(
    attribute: Node<'a, 'input>,
    definitions: &HashMap<String, Node<'a, 'input>>,
    context: &str,
    diags: &mut Diagnostics,
) -> StyleValues<'a, 'input> {
    let mut out = StyleValues {
        values: descendants_named(attribute, "value"),
        patterns: pattern_params(attribute),
    };

    // Worklist of referenced definition names, deduplicated so each
    // definition is expanded at most once
    let mut worklist: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for name in referenced_names(attribute) {
        if seen.insert(name.clone()) {
            worklist.push(name);
        }
    }

    let mut next = 0;
    while next < worklist.len() {
        let name = worklist[next].clone();
        next += 1;

        let define = match definitions.get(&name) {
            Some(define) => *define,
            None => {
                diags.warn(context, format!("unresolved reference '{}'", name));
                continue;
            }
        };

        out.values.extend(descendants_named(define, "value"));
        out.patterns.extend(pattern_params(define));
        for referenced in referenced_names(define) {
            if seen.insert(referenced.clone()) {
                worklist.push(referenced);
            }
        }
    }

    if out.is_empty() {
        diags.warn(context, "style attribute has no values or patterns");
    }
    out
}
