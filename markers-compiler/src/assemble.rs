//! Final assembly of the map after the walk
//!
//! Two responsibilities: inject the hand-authored markers that not every
//! schema version declares, and apply version-specific compatibility
//! patches. Manual entries go through the normal merge engine so a schema
//! that does declare them still gets conflict checking.

use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::map::{MapBuilder, MarkerInfo};

const MANUAL_SOURCE: &str = "manual";

/// Markers that appear as attributes of another marker in the tree-shaped
/// representations and therefore have no style value in the schema
fn manual_markers() -> Vec<(&'static str, MarkerInfo)> {
    fn attribute_marker(attaches_to: &[&str], attribute_name: &str) -> MarkerInfo {
        let mut info = MarkerInfo::of_type("char");
        info.is_attribute_marker_for = Some(attaches_to.iter().map(|m| m.to_string()).collect());
        info.attribute_marker_attribute_name = Some(attribute_name.to_string());
        info
    }

    vec![
        ("ca", attribute_marker(&["c"], "altnumber")),
        ("cp", attribute_marker(&["c"], "pubnumber")),
        ("va", attribute_marker(&["v"], "altnumber")),
        ("vp", attribute_marker(&["v"], "pubnumber")),
        ("cat", attribute_marker(&["esb", "ef", "f", "x"], "category")),
    ]
}

/// Merge the manual marker list into the map
pub fn inject_manual_markers(
    builder: &mut MapBuilder,
    diags: &mut Diagnostics,
) -> Result<(), CompileError> {
    for (name, info) in manual_markers() {
        builder.merge_marker(name, info, MANUAL_SOURCE, diags)?;
    }
    Ok(())
}

/// Version-specific fixes applied after the full walk
///
/// Schema major version 3 shipped without a usable default attribute on the
/// link marker; when `jmp` survived the walk without one, it becomes
/// `link-href`. The warning text has always named `w` instead of `jmp`;
/// the wording is kept as-is and pinned by a test.
pub fn apply_compat_patches(builder: &mut MapBuilder, version: &str, diags: &mut Diagnostics) {
    if !version.starts_with('3') {
        return;
    }
    if let Some(marker) = builder.marker_mut("jmp") {
        if marker.default_attribute.is_none() {
            marker.default_attribute = Some("link-href".to_string());
            diags.warn(
                "compat",
                "no default attribute found for marker 'w'; assuming 'link-href'",
            );
        }
    }
}
