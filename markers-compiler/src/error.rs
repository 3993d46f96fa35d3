//! Error types for schema compilation
//!
//! Fatal conflicts are structured values rather than process exits: two
//! descriptions of the same marker or marker-type that disagree on a
//! property that must be identical abort the whole compilation, and the
//! caller receives the offending names and both values. No partially built
//! map ever escapes.

use std::fmt;

/// Errors that abort a compilation
#[derive(Debug)]
pub enum CompileError {
    /// The schema text is not well-formed XML
    Schema(roxmltree::Error),
    /// Two descriptions of the same marker disagree on a scalar property
    MarkerConflict {
        marker: String,
        property: &'static str,
        existing: String,
        incoming: String,
        source: String,
    },
    /// Two descriptions of the same marker type disagree on a flag
    MarkerTypeConflict {
        marker_type: String,
        property: &'static str,
        existing: String,
        incoming: String,
        source: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Schema(e) => write!(f, "schema is not well-formed XML: {}", e),
            CompileError::MarkerConflict {
                marker,
                property,
                existing,
                incoming,
                source,
            } => write!(
                f,
                "conflicting definitions of marker '{}': {} was '{}', but '{}' declares '{}'",
                marker, property, existing, source, incoming
            ),
            CompileError::MarkerTypeConflict {
                marker_type,
                property,
                existing,
                incoming,
                source,
            } => write!(
                f,
                "conflicting definitions of marker type '{}': {} was {}, but '{}' declares {}",
                marker_type, property, existing, source, incoming
            ),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for CompileError {
    fn from(e: roxmltree::Error) -> Self {
        CompileError::Schema(e)
    }
}
