//! Errors that abort a pipeline run.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::helpers::HelperError;
use crate::paths::PathError;

/// Errors that can occur during a run. Every variant is fatal.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("template {name} from {} collides with {}", incoming.display(), existing.display())]
    Collision {
        name: String,
        existing: PathBuf,
        incoming: PathBuf,
    },

    #[error(transparent)]
    Helper(#[from] HelperError),

    #[error("markdown {}: {source}", path.display())]
    Markdown {
        path: PathBuf,
        #[source]
        source: webgen_mdx::ParseError,
    },

    #[error("invalid glob pattern {pattern:?}: {reason}")]
    Glob { pattern: String, reason: String },

    #[error("package manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Build a mapper from an I/O error to [`PipelineError::Io`].
pub(crate) fn io_err<'a>(
    op: &'static str,
    path: &'a Path,
) -> impl FnOnce(std::io::Error) -> PipelineError + 'a {
    move |source| PipelineError::Io {
        op,
        path: path.to_path_buf(),
        source,
    }
}

/// Build a mapper from a walk error to [`PipelineError::Walk`].
pub(crate) fn walk_err(root: &Path) -> impl FnOnce(walkdir::Error) -> PipelineError + '_ {
    move |source| PipelineError::Walk {
        root: root.to_path_buf(),
        source,
    }
}

/// Build a mapper from a template error to [`PipelineError::Template`].
pub(crate) fn template_err(name: &str) -> impl FnOnce(minijinja::Error) -> PipelineError + '_ {
    move |source| PipelineError::Template {
        name: name.to_string(),
        source,
    }
}
