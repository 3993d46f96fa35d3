//! Merge engines for marker and marker-type descriptions
//!
//! The walk discovers the same marker name in several definitions; these
//! engines fold each new description into the record built so far. Scalar
//! fields must agree where both sides speak (a real disagreement aborts the
//! compilation), one-sided presence wins with a warning, and list fields
//! union. Inputs are never mutated; every merge returns a fresh record.

use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::map::{MarkerInfo, MarkerTypeInfo};

/// Merge an incoming marker description into the existing record, if any
///
/// `name` is the marker (or pattern) the records describe, `source` the
/// definition the incoming description came from.
pub fn merge_marker(
    existing: Option<&MarkerInfo>,
    incoming: MarkerInfo,
    name: &str,
    source: &str,
    diags: &mut Diagnostics,
) -> Result<MarkerInfo, CompileError> {
    let existing = match existing {
        None => return Ok(incoming),
        Some(existing) => existing,
    };

    if existing.marker_type != incoming.marker_type {
        return Err(CompileError::MarkerConflict {
            marker: name.to_string(),
            property: "type",
            existing: existing.marker_type.clone(),
            incoming: incoming.marker_type,
            source: source.to_string(),
        });
    }

    Ok(MarkerInfo {
        marker_type: existing.marker_type.clone(),
        default_attribute: merge_scalar(
            existing.default_attribute.as_deref(),
            incoming.default_attribute.as_deref(),
            "defaultAttribute",
            name,
            source,
            diags,
        )?,
        attribute_markers: merge_list(
            existing.attribute_markers.as_deref(),
            incoming.attribute_markers,
            "attributeMarkers",
            name,
            source,
            diags,
        ),
        is_attribute_marker_for: merge_list(
            existing.is_attribute_marker_for.as_deref(),
            incoming.is_attribute_marker_for,
            "isAttributeMarkerFor",
            name,
            source,
            diags,
        ),
        attribute_marker_attribute_name: merge_scalar(
            existing.attribute_marker_attribute_name.as_deref(),
            incoming.attribute_marker_attribute_name.as_deref(),
            "attributeMarkerAttributeName",
            name,
            source,
            diags,
        )?,
    })
}

/// Merge an incoming marker-type description into the existing record
///
/// Every boolean flag must match exactly, with absence treated as `false`;
/// the one list field unions like marker lists do.
pub fn merge_marker_type(
    existing: Option<&MarkerTypeInfo>,
    incoming: MarkerTypeInfo,
    name: &str,
    source: &str,
    diags: &mut Diagnostics,
) -> Result<MarkerTypeInfo, CompileError> {
    let existing = match existing {
        None => return Ok(incoming),
        Some(existing) => existing,
    };

    let flags: [(&'static str, Option<bool>, Option<bool>); 5] = [
        (
            "hasStyleAttribute",
            existing.has_style_attribute,
            incoming.has_style_attribute,
        ),
        (
            "shouldHaveNewlineBefore",
            existing.should_have_newline_before,
            incoming.should_have_newline_before,
        ),
        (
            "hasClosingMarker",
            existing.has_closing_marker,
            incoming.has_closing_marker,
        ),
        (
            "isClosingMarkerOptional",
            existing.is_closing_marker_optional,
            incoming.is_closing_marker_optional,
        ),
        (
            "isClosingMarkerEmpty",
            existing.is_closing_marker_empty,
            incoming.is_closing_marker_empty,
        ),
    ];
    for (property, prior, new) in flags {
        if prior.unwrap_or(false) != new.unwrap_or(false) {
            return Err(CompileError::MarkerTypeConflict {
                marker_type: name.to_string(),
                property,
                existing: prior.unwrap_or(false).to_string(),
                incoming: new.unwrap_or(false).to_string(),
                source: source.to_string(),
            });
        }
    }

    Ok(MarkerTypeInfo {
        has_style_attribute: existing.has_style_attribute.or(incoming.has_style_attribute),
        should_have_newline_before: existing
            .should_have_newline_before
            .or(incoming.should_have_newline_before),
        has_closing_marker: existing.has_closing_marker.or(incoming.has_closing_marker),
        is_closing_marker_optional: existing
            .is_closing_marker_optional
            .or(incoming.is_closing_marker_optional),
        is_closing_marker_empty: existing
            .is_closing_marker_empty
            .or(incoming.is_closing_marker_empty),
        skip_output_attribute_to_usfm: merge_list(
            existing.skip_output_attribute_to_usfm.as_deref(),
            incoming.skip_output_attribute_to_usfm,
            "skipOutputAttributeToUsfm",
            name,
            source,
            diags,
        ),
    })
}

/// Scalar rule: equal or one-sided; both-present-and-different is fatal
fn merge_scalar(
    existing: Option<&str>,
    incoming: Option<&str>,
    property: &'static str,
    name: &str,
    source: &str,
    diags: &mut Diagnostics,
) -> Result<Option<String>, CompileError> {
    match (existing, incoming) {
        (None, None) => Ok(None),
        (Some(e), Some(i)) if e == i => Ok(Some(e.to_string())),
        (Some(e), Some(i)) => Err(CompileError::MarkerConflict {
            marker: name.to_string(),
            property,
            existing: e.to_string(),
            incoming: i.to_string(),
            source: source.to_string(),
        }),
        (Some(e), None) => {
            diags.warn(
                source,
                format!("'{}' leaves {} of '{}' unset; keeping '{}'", source, property, name, e),
            );
            Ok(Some(e.to_string()))
        }
        (None, Some(i)) => {
            diags.warn(
                source,
                format!("{} of '{}' was unset so far; '{}' sets it to '{}'", property, name, source, i),
            );
            Ok(Some(i.to_string()))
        }
    }
}

/// List rule: one-sided presence wins with a warning (absence never becomes
/// an empty list); both present merge to the deduplicated union when they
/// differ as sets
fn merge_list(
    existing: Option<&[String]>,
    incoming: Option<Vec<String>>,
    property: &'static str,
    name: &str,
    source: &str,
    diags: &mut Diagnostics,
) -> Option<Vec<String>> {
    match (existing, incoming) {
        (None, None) => None,
        (Some(e), None) => {
            diags.warn(
                source,
                format!("'{}' leaves {} of '{}' unset; keeping the prior list", source, property, name),
            );
            Some(e.to_vec())
        }
        (None, Some(i)) => {
            diags.warn(
                source,
                format!("{} of '{}' was unset so far; taking the list from '{}'", property, name, source),
            );
            Some(i)
        }
        (Some(e), Some(i)) => {
            if set_equal(e, &i) {
                return Some(e.to_vec());
            }
            diags.warn(
                source,
                format!("{} of '{}' differs between descriptions; merging the lists", property, name),
            );
            let mut union = e.to_vec();
            for item in i {
                if !union.contains(&item) {
                    union.push(item);
                }
            }
            Some(union)
        }
    }
}

fn set_equal(a: &[String], b: &[String]) -> bool {
    a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}
