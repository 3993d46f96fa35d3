//! End-to-end compilation tests against the miniature schema fixture
//!
//! The fixture is a trimmed-down but structurally faithful cut of the real
//! schema: literal style values behind ref chains, a pattern-styled
//! milestone, nested elements, bookkeeping attributes and reserved
//! table-row definitions.

use markers_compiler::{compile, CompileError, CompileOptions, CompileOutput};
use rstest::rstest;

const FIXTURE: &str = include_str!("fixtures/usx-mini.rng");

fn compile_fixture() -> CompileOutput {
    compile(
        FIXTURE,
        CompileOptions {
            version: "3.1".to_string(),
            commit: "abc1234".to_string(),
            base: None,
        },
    )
    .expect("fixture should compile")
}

#[rstest]
#[case("wj")]
#[case("add")]
#[case("nd")]
fn literal_char_styles_become_char_markers(#[case] marker: &str) {
    let output = compile_fixture();
    let info = &output.map.markers[marker];
    assert_eq!(info.marker_type, "char");
    assert_eq!(info.default_attribute, None);
}

#[test]
fn referenced_definitions_contribute_values() {
    let output = compile_fixture();
    // fr/ft live two refs away from the char element's style attribute
    assert_eq!(output.map.markers["fr"].marker_type, "char");
    assert_eq!(output.map.markers["ft"].marker_type, "char");
}

#[test]
fn one_sided_default_attribute_merges_with_warning() {
    let output = compile_fixture();
    // 'xt' is plain in the shared char styles and annotated in the
    // cross-reference definition; the present side wins
    assert_eq!(
        output.map.markers["xt"].default_attribute.as_deref(),
        Some("href")
    );
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message.contains("defaultAttribute") && d.message.contains("'xt'")));
}

#[test]
fn required_attribute_becomes_default() {
    let output = compile_fixture();
    assert_eq!(
        output.map.markers["id"].default_attribute.as_deref(),
        Some("code")
    );
    assert_eq!(
        output.map.markers["v"].default_attribute.as_deref(),
        Some("number")
    );
}

#[test]
fn optional_attribute_is_default_only_without_required_ones() {
    let output = compile_fixture();
    // The milestone declares no required attribute; 'who' is first optional
    let pattern = output
        .map
        .markers_reg_exp
        .iter()
        .find(|(key, _)| key.source() == "qt[0-9]?-[se]")
        .map(|(_, info)| info)
        .expect("milestone pattern should be present");
    assert_eq!(pattern.marker_type, "ms");
    assert_eq!(pattern.default_attribute.as_deref(), Some("who"));
}

#[test]
fn pattern_keys_match_whole_names() {
    let output = compile_fixture();
    let (key, _) = output
        .map
        .markers_reg_exp
        .iter()
        .find(|(key, _)| key.source() == "qt[0-9]?-[se]")
        .unwrap();
    assert!(key.matches("qt1-s"));
    assert!(key.matches("qt-e"));
    assert!(!key.matches("qt1"));
    assert!(!key.matches("xqt1-s"));
}

#[test]
fn para_markers_have_no_default_attribute() {
    let output = compile_fixture();
    for marker in ["p", "q1", "q2", "mt1", "mt2"] {
        assert_eq!(
            output.map.markers[marker].default_attribute, None,
            "para marker '{}' must not get the vid anchor as default",
            marker
        );
    }
}

#[test]
fn jmp_compat_patch_sets_link_href_and_warns_oddly() {
    let output = compile_fixture();
    assert_eq!(
        output.map.markers["jmp"].default_attribute.as_deref(),
        Some("link-href")
    );
    // The patch's warning text has always named 'w' rather than 'jmp';
    // the wording is pinned here on purpose
    let patch_warning = output
        .diagnostics
        .iter()
        .find(|d| d.message.contains("link-href"))
        .expect("patch should warn");
    assert!(patch_warning.message.contains("'w'"));
    assert!(!patch_warning.message.contains("'jmp'"));
}

#[test]
fn manual_attribute_markers_are_injected() {
    let output = compile_fixture();
    let ca = &output.map.markers["ca"];
    assert_eq!(ca.marker_type, "char");
    assert_eq!(ca.is_attribute_marker_for, Some(vec!["c".to_string()]));
    assert_eq!(ca.attribute_marker_attribute_name.as_deref(), Some("altnumber"));

    let cat = &output.map.markers["cat"];
    assert_eq!(
        cat.is_attribute_marker_for,
        Some(vec![
            "esb".to_string(),
            "ef".to_string(),
            "f".to_string(),
            "x".to_string()
        ])
    );
}

#[test]
fn implicit_marker_for_element_without_style() {
    let output = compile_fixture();
    assert_eq!(output.map.markers["table"].marker_type, "table");
    assert_eq!(
        output.map.marker_types["table"].should_have_newline_before,
        Some(true)
    );
}

#[test]
fn marker_types_carry_derived_flags() {
    let output = compile_fixture();

    let char_type = &output.map.marker_types["char"];
    assert_eq!(char_type.has_style_attribute, Some(true));
    assert_eq!(char_type.has_closing_marker, Some(true));
    assert_eq!(char_type.is_closing_marker_optional, Some(true));
    assert_eq!(char_type.should_have_newline_before, None);
    assert_eq!(
        char_type.skip_output_attribute_to_usfm,
        Some(vec!["closed".to_string()])
    );

    let para_type = &output.map.marker_types["para"];
    assert_eq!(para_type.should_have_newline_before, Some(true));
    assert_eq!(para_type.has_closing_marker, None);
    assert_eq!(
        para_type.skip_output_attribute_to_usfm,
        Some(vec!["vid".to_string()])
    );

    let ms_type = &output.map.marker_types["ms"];
    assert_eq!(ms_type.has_closing_marker, Some(true));
    assert_eq!(ms_type.is_closing_marker_empty, Some(true));
}

#[test]
fn unproductive_definitions_are_reported_skipped() {
    let output = compile_fixture();
    // Pure grouping and style-list definitions yield no marker themselves
    for name in ["ChapterContent", "ParaStyle", "TitleStyle", "CharStyle", "FootnoteCharStyle"] {
        assert!(
            output.skipped_definitions.contains(name),
            "'{}' should be reported skipped",
            name
        );
        assert!(!output.map.markers.contains_key(name));
    }
}

#[test]
fn reserved_row_and_cell_definitions_are_skipped_outright() {
    let output = compile_fixture();
    assert!(output.skipped_definitions.contains("Row"));
    assert!(output.skipped_definitions.contains("Cell"));
    // Their style values never reach the map
    assert!(!output.map.markers.contains_key("tr"));
    assert!(output
        .map
        .markers_reg_exp
        .iter()
        .all(|(key, _)| key.source() != "tc[0-9]+"));
}

#[test]
fn compilation_is_deterministic() {
    let first = serde_json::to_string(&compile_fixture().map).unwrap();
    let second = serde_json::to_string(&compile_fixture().map).unwrap();
    assert_eq!(first, second);
}

#[test]
fn all_mappings_are_sorted_case_insensitively() {
    let output = compile_fixture();

    let marker_keys: Vec<String> = output.map.markers.keys().map(|k| k.to_lowercase()).collect();
    let mut sorted = marker_keys.clone();
    sorted.sort();
    assert_eq!(marker_keys, sorted);

    let type_keys: Vec<String> = output
        .map
        .marker_types
        .keys()
        .map(|k| k.to_lowercase())
        .collect();
    let mut sorted = type_keys.clone();
    sorted.sort();
    assert_eq!(type_keys, sorted);

    let pattern_keys: Vec<String> = output
        .map
        .markers_reg_exp
        .keys()
        .map(|k| k.source().to_lowercase())
        .collect();
    let mut sorted = pattern_keys.clone();
    sorted.sort();
    assert_eq!(pattern_keys, sorted);
}

#[test]
fn provenance_fields_are_carried_through() {
    let output = compile_fixture();
    assert_eq!(output.map.version, "3.1");
    assert_eq!(output.map.commit, "abc1234");
}

#[test]
fn layering_onto_own_output_is_a_fixed_point() {
    let first = compile_fixture();
    let layered = compile(
        FIXTURE,
        CompileOptions {
            version: "3.1".to_string(),
            commit: "abc1234".to_string(),
            base: Some(first.map.clone()),
        },
    )
    .expect("layered compile should succeed");

    assert_eq!(
        serde_json::to_string(&first.map).unwrap(),
        serde_json::to_string(&layered.map).unwrap()
    );
}

#[test]
fn conflicting_marker_types_abort_compilation() {
    // Same marker name 'p' described as para in one definition and char in
    // another
    let schema = "<grammar>\
        <define name=\"Para\"><element name=\"para\">\
        <attribute name=\"style\"><value>p</value></attribute>\
        </element></define>\
        <define name=\"Stray\"><element name=\"char\">\
        <attribute name=\"style\"><value>p</value></attribute>\
        </element></define>\
        </grammar>";

    let err = compile(schema, CompileOptions::default()).unwrap_err();
    match err {
        CompileError::MarkerConflict {
            marker, property, ..
        } => {
            assert_eq!(marker, "p");
            assert_eq!(property, "type");
        }
        other => panic!("expected MarkerConflict, got {}", other),
    }
}

#[test]
fn conflicting_closing_flags_abort_compilation() {
    let schema = "<grammar>\
        <define name=\"Char\"><element name=\"char\">\
        <attribute name=\"style\"><value>wj</value></attribute>\
        <optional><attribute name=\"closed\"/></optional>\
        </element></define>\
        <define name=\"Char2\"><element name=\"char\">\
        <attribute name=\"style\"><value>nd</value></attribute>\
        </element></define>\
        </grammar>";

    let err = compile(schema, CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::MarkerTypeConflict {
            property: "hasClosingMarker",
            ..
        }
    ));
}

#[test]
fn malformed_schema_is_a_schema_error() {
    let err = compile("<grammar><define", CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CompileError::Schema(_)));
}

#[test]
fn diagnostics_do_not_leak_into_the_map() {
    let output = compile_fixture();
    assert!(!output.diagnostics.is_empty());

    let json = serde_json::to_string(&output.map).unwrap();
    // Provenance leads, then the three mappings; nothing else
    assert!(json.starts_with("{\"version\""));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 5);
    for key in ["version", "commit", "markers", "markersRegExp", "markerTypes"] {
        assert!(object.contains_key(key), "missing top-level key '{}'", key);
    }
}
