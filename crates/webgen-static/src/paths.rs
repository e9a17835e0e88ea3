//! Mapping source paths to output paths and template names.
//!
//! Everything here is pure: no function touches the filesystem.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Directory under the working root holding page templates.
pub const PAGES_DIR: &str = "pages";

/// Extension of template files.
pub const TEMPLATE_EXT: &str = "tmpl";

/// Extension of rendered pages.
pub const OUTPUT_EXT: &str = "html";

/// Errors produced while mapping paths.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("{} is not under {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("{} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),
}

/// Replace the `root` prefix of `path` with `target`.
pub fn mirror(root: &Path, target: &Path, path: &Path) -> Result<PathBuf, PathError> {
    let rel = relative(root, path)?;
    if rel.as_os_str().is_empty() {
        Ok(target.to_path_buf())
    } else {
        Ok(target.join(rel))
    }
}

/// `path` relative to `root`.
pub fn relative<'a>(root: &Path, path: &'a Path) -> Result<&'a Path, PathError> {
    path.strip_prefix(root).map_err(|_| PathError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Namespace key for a template: `dir/name`, or just `name` at the top.
pub fn template_key(dir: &Path, name: &str) -> String {
    let mut key = to_slash(dir);
    if !key.is_empty() {
        key.push('/');
    }
    key.push_str(name);
    key
}

/// A page template discovered under the pages tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTask {
    /// Source template file
    pub source: PathBuf,

    /// Directory relative to the working root, leading `pages` stripped
    pub rel_dir: PathBuf,

    /// File name without the template extension
    pub name: String,
}

impl RenderTask {
    /// Derive a task from a template path under `work_dir`.
    pub fn from_source(work_dir: &Path, source: &Path) -> Result<Self, PathError> {
        let rel = relative(work_dir, source)?;
        let dir = rel.parent().unwrap_or(Path::new(""));

        let mut components = dir.components();
        let rel_dir: PathBuf = match components.next() {
            Some(Component::Normal(first)) if first == OsStr::new(PAGES_DIR) => {
                components.collect()
            }
            _ => dir.to_path_buf(),
        };

        let file_name = source
            .file_name()
            .ok_or_else(|| PathError::NoFileName(source.to_path_buf()))?
            .to_str()
            .ok_or_else(|| PathError::NotUtf8(source.to_path_buf()))?;

        let name = file_name
            .strip_suffix(&format!(".{TEMPLATE_EXT}"))
            .unwrap_or(file_name)
            .to_string();

        Ok(Self {
            source: source.to_path_buf(),
            rel_dir,
            name,
        })
    }

    /// Namespace key the page is registered under.
    pub fn key(&self) -> String {
        template_key(&self.rel_dir, &self.name)
    }

    /// Output file for this page under `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir
            .join(&self.rel_dir)
            .join(format!("{}.{OUTPUT_EXT}", self.name))
    }
}

/// Shortens paths in log lines to `$WORK/...` and `$OUT/...`.
#[derive(Debug, Clone)]
pub struct PathAliases {
    work: PathBuf,
    out: PathBuf,
}

impl PathAliases {
    /// Create aliases for a working root and an output root.
    pub fn new(work: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            work: work.into(),
            out: out.into(),
        }
    }

    /// Display `path` with its root replaced by an alias.
    pub fn show(&self, path: &Path) -> String {
        // Output first: it may live inside the working root.
        for (root, alias) in [(&self.out, "$OUT"), (&self.work, "$WORK")] {
            if let Ok(rel) = path.strip_prefix(root) {
                let rel = to_slash(rel);
                return if rel.is_empty() {
                    alias.to_string()
                } else {
                    format!("{alias}/{rel}")
                };
            }
        }
        path.display().to_string()
    }
}
