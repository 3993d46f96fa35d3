//! Git provenance for the compiled map
//!
//! The map records which schema revision it was compiled from. Both values
//! come from the repository containing the schema file, shelling out to
//! git; a missing repository or git binary degrades to `None` and the
//! caller falls back to explicit flags.

use std::path::Path;
use std::process::Command;

/// The most recent tag reachable from HEAD, if any
pub fn schema_version(dir: &Path) -> Option<String> {
    git(dir, &["describe", "--tags", "--abbrev=0"])
}

/// Short commit id of HEAD, with a `-dirty` suffix when the working tree
/// has uncommitted changes
pub fn commit_id(dir: &Path) -> Option<String> {
    let id = git(dir, &["rev-parse", "--short", "HEAD"])?;
    if working_tree_dirty(dir) {
        Some(format!("{}-dirty", id))
    } else {
        Some(id)
    }
}

fn working_tree_dirty(dir: &Path) -> bool {
    git(dir, &["status", "--porcelain"]).is_some_and(|status| !status.is_empty())
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}
