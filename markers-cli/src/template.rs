//! Patching of a template file with the generated map
//!
//! Some consumers keep the map embedded in a source file rather than
//! reading a standalone JSON document. The region between the two marker
//! lines is replaced with the generated content; everything outside it is
//! preserved byte-for-byte, including the marker lines themselves.

use std::fmt;

const BEGIN_MARKER: &str = "// BEGIN MARKERS MAP";
const END_MARKER: &str = "// END MARKERS MAP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    BeginMarkerMissing,
    EndMarkerMissing,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::BeginMarkerMissing => {
                write!(f, "template has no '{}' line", BEGIN_MARKER)
            }
            TemplateError::EndMarkerMissing => {
                write!(f, "template has no '{}' line after the begin marker", END_MARKER)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Replace the marked region of `template` with `replacement`
pub fn patch(template: &str, replacement: &str) -> Result<String, TemplateError> {
    let begin = template
        .find(BEGIN_MARKER)
        .ok_or(TemplateError::BeginMarkerMissing)?;
    let begin_line_end = match template[begin..].find('\n') {
        Some(offset) => begin + offset + 1,
        // The begin marker is on the last line, so no end marker follows
        None => return Err(TemplateError::EndMarkerMissing),
    };
    let end = begin_line_end
        + template[begin_line_end..]
            .find(END_MARKER)
            .ok_or(TemplateError::EndMarkerMissing)?;
    let end_line_start = template[..end].rfind('\n').map(|i| i + 1).unwrap_or(0);

    let mut patched = String::with_capacity(template.len() + replacement.len());
    patched.push_str(&template[..begin_line_end]);
    patched.push_str(replacement);
    if !replacement.ends_with('\n') {
        patched.push('\n');
    }
    patched.push_str(&template[end_line_start..]);
    Ok(patched)
}
