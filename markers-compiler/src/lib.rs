//! Schema compiler for the USFM/USX/USJ markers map
//!
//!     Compiles the RelaxNG schema of the XML representation into a
//!     normalized lookup table, the markers map, that converters between
//!     the three representations of the same content consult. This crate
//!     only produces the table; it neither parses the dialect itself nor
//!     converts anything.
//!
//! Architecture
//!
//!     One pass over the schema's named definitions, folding discovered
//!     marker descriptions into an accumulator, then a short assembly
//!     stage. The file structure:
//!     .
//!     ├── diagnostics.rs      # Warning collection handed back to the caller
//!     ├── error.rs            # Fatal conflicts as structured errors
//!     ├── schema.rs           # DOM navigation helpers and the scope predicate
//!     ├── resolve.rs          # ref-indirection expansion for style attributes
//!     ├── infer.rs            # Default-attribute inference
//!     ├── map.rs              # Record types, pattern keys, the map builder
//!     ├── merge.rs            # Marker and marker-type merge engines
//!     ├── walker.rs           # The definition walk
//!     ├── assemble.rs         # Manual markers, compat patches
//!     └── lib.rs
//!
//!     Compilation is a pure function of (schema text, version, commit,
//!     optional base map); the only side channel is the diagnostics list in
//!     the output. Recoverable anomalies degrade with a warning; two
//!     descriptions that genuinely disagree abort with a structured error
//!     and no map escapes.

pub mod assemble;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod map;
pub mod merge;
pub mod resolve;
pub mod schema;
pub mod walker;

use std::collections::BTreeSet;

use roxmltree::Document;

pub use crate::diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use crate::error::CompileError;
pub use crate::map::{MapBuilder, MarkerInfo, MarkerTypeInfo, MarkersMap, PatternKey};

/// Inputs of one compilation beyond the schema text itself
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Schema version recorded in the map (usually the git tag)
    pub version: String,
    /// Commit the schema text was taken from
    pub commit: String,
    /// Previously compiled map to layer this schema onto
    pub base: Option<MarkersMap>,
}

/// Everything one compilation produces
#[derive(Debug)]
pub struct CompileOutput {
    pub map: MarkersMap,
    /// Recoverable anomalies, for reporting only
    pub diagnostics: Vec<Diagnostic>,
    /// Definitions that yielded no marker, for reporting only
    pub skipped_definitions: BTreeSet<String>,
}

/// Compile a schema document into a markers map
pub fn compile(schema_text: &str, options: CompileOptions) -> Result<CompileOutput, CompileError> {
    let doc = Document::parse(schema_text)?;
    let mut diags = Diagnostics::new();
    let mut builder = match options.base {
        Some(base) => MapBuilder::seeded(base),
        None => MapBuilder::new(),
    };

    let skipped_definitions = walker::walk(&doc, &mut builder, &mut diags)?;
    assemble::inject_manual_markers(&mut builder, &mut diags)?;
    assemble::apply_compat_patches(&mut builder, &options.version, &mut diags);

    Ok(CompileOutput {
        map: builder.finish(options.version, options.commit),
        diagnostics: diags.into_entries(),
        skipped_definitions,
    })
}
