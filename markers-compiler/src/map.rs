//! The compiled markers map and its building blocks
//!
//! `MarkerInfo` and `MarkerTypeInfo` are the two record types of the map;
//! both keep optional fields absent (never null, never empty-list) until
//! some description actually supplies them, which is what the merge engines
//! in [`crate::merge`] rely on. `MapBuilder` is the insertion-ordered
//! accumulator threaded through the walk; `finish` sorts and freezes it
//! into the `MarkersMap` artifact.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::merge;

/// One named unit of the markup dialect
///
/// Attribute markers additionally carry `is_attribute_marker_for` (the
/// markers they attach to, non-empty when present) and optionally the
/// attribute name they map to on those markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerInfo {
    /// Structural category of the marker; immutable once merged
    #[serde(rename = "type")]
    pub marker_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_attribute: Option<String>,
    /// Markers that act as attributes of this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_markers: Option<Vec<String>>,
    /// Markers this one attaches to as an attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_attribute_marker_for: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_marker_attribute_name: Option<String>,
}

impl MarkerInfo {
    /// A bare marker of the given structural category
    pub fn of_type(marker_type: impl Into<String>) -> Self {
        MarkerInfo {
            marker_type: marker_type.into(),
            default_attribute: None,
            attribute_markers: None,
            is_attribute_marker_for: None,
            attribute_marker_attribute_name: None,
        }
    }
}

/// A structural category shared by many markers
///
/// Boolean fields compare with absence treated as `false`; fields that
/// would be `false` stay absent so the serialized map carries only positive
/// facts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerTypeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_style_attribute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_have_newline_before: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_closing_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closing_marker_optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closing_marker_empty: Option<bool>,
    /// Bookkeeping attributes never serialized back to the line-oriented form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_output_attribute_to_usfm: Option<Vec<String>>,
}

/// Key of the pattern-matched marker table
///
/// Stored and compared by pattern source text; matched through the compiled
/// form, anchored so a pattern covers whole marker names only.
#[derive(Debug, Clone)]
pub struct PatternKey {
    source: String,
    regex: Regex,
}

impl PatternKey {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(PatternKey {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `name` is one of the marker names this pattern covers
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for PatternKey {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PatternKey {}

impl Hash for PatternKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Serialize for PatternKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PatternKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        PatternKey::new(&source).map_err(de::Error::custom)
    }
}

/// The compiled artifact: provenance plus the three sorted mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkersMap {
    pub version: String,
    pub commit: String,
    pub markers: IndexMap<String, MarkerInfo>,
    pub markers_reg_exp: IndexMap<PatternKey, MarkerInfo>,
    pub marker_types: IndexMap<String, MarkerTypeInfo>,
}

/// Insertion-ordered accumulator for one compilation call
///
/// Later writes under an existing key merge through [`crate::merge`] rather
/// than replacing, so conflicting descriptions surface no matter which
/// definition the walk sees first.
#[derive(Debug, Default)]
pub struct MapBuilder {
    markers: IndexMap<String, MarkerInfo>,
    markers_reg_exp: IndexMap<PatternKey, MarkerInfo>,
    marker_types: IndexMap<String, MarkerTypeInfo>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously compiled map (schema layering)
    pub fn seeded(base: MarkersMap) -> Self {
        MapBuilder {
            markers: base.markers,
            markers_reg_exp: base.markers_reg_exp,
            marker_types: base.marker_types,
        }
    }

    pub fn marker(&self, name: &str) -> Option<&MarkerInfo> {
        self.markers.get(name)
    }

    pub fn marker_mut(&mut self, name: &str) -> Option<&mut MarkerInfo> {
        self.markers.get_mut(name)
    }

    pub fn marker_type(&self, name: &str) -> Option<&MarkerTypeInfo> {
        self.marker_types.get(name)
    }

    /// Look up a pattern-keyed marker by its pattern source text
    pub fn pattern_marker(&self, source: &str) -> Option<&MarkerInfo> {
        self.markers_reg_exp
            .iter()
            .find(|(key, _)| key.source() == source)
            .map(|(_, info)| info)
    }

    /// Merge a literal-name marker description into the map
    pub fn merge_marker(
        &mut self,
        name: &str,
        incoming: MarkerInfo,
        source: &str,
        diags: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        let merged = merge::merge_marker(self.markers.get(name), incoming, name, source, diags)?;
        self.markers.insert(name.to_string(), merged);
        Ok(())
    }

    /// Merge a pattern-keyed marker description into the map
    pub fn merge_pattern_marker(
        &mut self,
        key: PatternKey,
        incoming: MarkerInfo,
        source: &str,
        diags: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        let merged = merge::merge_marker(
            self.markers_reg_exp.get(&key),
            incoming,
            key.source(),
            source,
            diags,
        )?;
        self.markers_reg_exp.insert(key, merged);
        Ok(())
    }

    /// Merge a marker-type description into the map
    pub fn merge_marker_type(
        &mut self,
        name: &str,
        incoming: MarkerTypeInfo,
        source: &str,
        diags: &mut Diagnostics,
    ) -> Result<(), CompileError> {
        let merged =
            merge::merge_marker_type(self.marker_types.get(name), incoming, name, source, diags)?;
        self.marker_types.insert(name.to_string(), merged);
        Ok(())
    }

    /// Sort all three mappings case-insensitively by key and freeze
    ///
    /// The sort is stable: keys that are case-insensitively equal keep
    /// their insertion order.
    pub fn finish(mut self, version: impl Into<String>, commit: impl Into<String>) -> MarkersMap {
        self.markers
            .sort_by(|k1, _, k2, _| k1.to_lowercase().cmp(&k2.to_lowercase()));
        self.markers_reg_exp
            .sort_by(|k1, _, k2, _| k1.source().to_lowercase().cmp(&k2.source().to_lowercase()));
        self.marker_types
            .sort_by(|k1, _, k2, _| k1.to_lowercase().cmp(&k2.to_lowercase()));

        MarkersMap {
            version: version.into(),
            commit: commit.into(),
            markers: self.markers,
            markers_reg_exp: self.markers_reg_exp,
            marker_types: self.marker_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_key_matches_whole_name_only() {
        let key = PatternKey::new("z.+").expect("valid pattern");
        assert!(key.matches("z-custom"));
        assert!(!key.matches("z"));
        // Anchored: a mid-string hit is not a match
        assert!(!key.matches("az-custom"));
    }

    #[test]
    fn test_pattern_key_identity_is_source_text() {
        let a = PatternKey::new("tc[0-9]+").unwrap();
        let b = PatternKey::new("tc[0-9]+").unwrap();
        let c = PatternKey::new("tcr[0-9]+").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pattern_key_rejects_invalid_regex() {
        assert!(PatternKey::new("tc[").is_err());
    }

    #[test]
    fn test_marker_info_serialization_shape() {
        let mut info = MarkerInfo::of_type("char");
        info.default_attribute = Some("lemma".to_string());

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "char");
        assert_eq!(json["defaultAttribute"], "lemma");
        // Absent fields stay absent, not null
        assert!(json.get("attributeMarkers").is_none());
        assert!(json.get("isAttributeMarkerFor").is_none());
    }

    #[test]
    fn test_marker_type_serialization_shape() {
        let info = MarkerTypeInfo {
            has_style_attribute: Some(true),
            has_closing_marker: Some(true),
            is_closing_marker_optional: Some(true),
            ..Default::default()
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["hasStyleAttribute"], true);
        assert_eq!(json["hasClosingMarker"], true);
        assert_eq!(json["isClosingMarkerOptional"], true);
        assert!(json.get("shouldHaveNewlineBefore").is_none());
        assert!(json.get("skipOutputAttributeToUsfm").is_none());
    }

    #[test]
    fn test_map_round_trips_through_json() {
        let mut builder = MapBuilder::new();
        let mut diags = Diagnostics::new();
        builder
            .merge_marker("wj", MarkerInfo::of_type("char"), "Char", &mut diags)
            .unwrap();
        builder
            .merge_pattern_marker(
                PatternKey::new("tc[0-9]+").unwrap(),
                MarkerInfo::of_type("cell"),
                "Cell",
                &mut diags,
            )
            .unwrap();
        let map = builder.finish("3.1", "abc1234");

        let json = serde_json::to_string(&map).unwrap();
        let back: MarkersMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, "3.1");
        assert_eq!(back.commit, "abc1234");
        assert_eq!(back.markers["wj"].marker_type, "char");
        let key = PatternKey::new("tc[0-9]+").unwrap();
        assert_eq!(back.markers_reg_exp[&key].marker_type, "cell");
    }

    #[test]
    fn test_finish_sorts_case_insensitively() {
        let mut builder = MapBuilder::new();
        let mut diags = Diagnostics::new();
        for name in ["zb", "Av", "ab", "ZA"] {
            builder
                .merge_marker(name, MarkerInfo::of_type("char"), "t", &mut diags)
                .unwrap();
        }
        let map = builder.finish("3.1", "abc1234");

        let keys: Vec<_> = map.markers.keys().cloned().collect();
        assert_eq!(keys, vec!["ab", "Av", "ZA", "zb"]);
    }

    #[test]
    fn test_finish_sort_is_stable_for_case_insensitive_ties() {
        let mut builder = MapBuilder::new();
        let mut diags = Diagnostics::new();
        for name in ["Nd", "nd", "ND"] {
            builder
                .merge_marker(name, MarkerInfo::of_type("char"), "t", &mut diags)
                .unwrap();
        }
        let map = builder.finish("3.1", "abc1234");

        let keys: Vec<_> = map.markers.keys().cloned().collect();
        assert_eq!(keys, vec!["Nd", "nd", "ND"]);
    }

    #[test]
    fn test_seeded_builder_keeps_base_entries() {
        let mut builder = MapBuilder::new();
        let mut diags = Diagnostics::new();
        builder
            .merge_marker("p", MarkerInfo::of_type("para"), "Para", &mut diags)
            .unwrap();
        let base = builder.finish("3.0", "old");

        let seeded = MapBuilder::seeded(base);
        assert_eq!(seeded.marker("p").unwrap().marker_type, "para");
    }
}
