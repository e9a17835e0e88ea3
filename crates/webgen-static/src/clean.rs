//! Emptying the output directory while keeping version control data.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{io_err, walk_err, Result};
use crate::paths::relative;

/// Any path component containing this token is preserved.
pub const VCS_MARKER: &str = ".git";

/// Whether a path relative to the cleaned directory belongs to version control.
pub fn is_vcs_path(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(s) => s.to_string_lossy().contains(VCS_MARKER),
        _ => false,
    })
}

/// Remove everything under `target` except `target` itself and version
/// control paths. Directories that still hold preserved entries are kept.
///
/// A missing `target` is not an error. Returns the number of entries removed.
pub fn clean_tree(target: &Path) -> Result<usize> {
    if fs::symlink_metadata(target).is_err() {
        tracing::debug!("nothing to clean at {}", target.display());
        return Ok(0);
    }

    let mut keep: HashSet<PathBuf> = HashSet::new();
    let mut removed = 0;

    for entry in WalkDir::new(target).min_depth(1).contents_first(true) {
        let entry = entry.map_err(walk_err(target))?;
        let path = entry.path();

        if is_vcs_path(relative(target, path)?) {
            for ancestor in path.ancestors().skip(1) {
                if ancestor == target || !keep.insert(ancestor.to_path_buf()) {
                    break;
                }
            }
            continue;
        }

        if entry.file_type().is_dir() {
            if keep.contains(path) {
                continue;
            }
            fs::remove_dir(path).map_err(io_err("rmdir", path))?;
        } else {
            fs::remove_file(path).map_err(io_err("rm", path))?;
        }
        removed += 1;
    }

    Ok(removed)
}
