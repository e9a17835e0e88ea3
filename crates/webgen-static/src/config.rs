//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is resolved once at startup and handed by reference
//! to every stage. Nothing reads configuration from ambient state.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::paths::PAGES_DIR;
use crate::publish::DEFAULT_COMMIT_MESSAGE;

/// Directory under the working root holding static assets.
pub const CONTENT_DIR: &str = "content";

/// Directory under the working root holding shared template fragments.
pub const TEMPLATES_DIR: &str = "templates";

/// Environment variable holding the API token used when authenticating.
pub const TOKEN_ENV: &str = "GITHUB_API_TOKEN";

/// What to do when two templates resolve to the same logical name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail the run.
    #[default]
    Reject,
    /// Keep the most recent registration.
    Replace,
}

/// Errors detected while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid serve address {addr:?}: {reason}")]
    InvalidServeAddr { addr: String, reason: String },

    #[error("$GITHUB_API_TOKEN not set to an API token; drop --auth to continue without authentication")]
    MissingApiToken,

    #[error("output directory {} must differ from the working root", .0.display())]
    OutputIsWorkDir(PathBuf),

    #[error("source directory {} not found", .0.display())]
    MissingSourceDir(PathBuf),
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Working root containing content/, pages/ and templates/
    pub work_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Remove existing output (except version control paths) before building
    pub clean: bool,

    /// Ask the documentation generator to refresh its sources
    pub update: bool,

    /// Generate package documentation
    pub docs: bool,

    /// Require an API token for the documentation generator
    pub auth: bool,

    /// Commit and push the output directory after a successful build
    pub push: bool,

    /// Address to serve the output directory on after the build
    pub serve: Option<SocketAddr>,

    /// API token handed to the documentation generator
    pub api_token: Option<String>,

    /// Template name collision handling
    pub on_collision: CollisionPolicy,

    /// Title for Markdown documents that do not declare one
    pub default_title: String,

    /// Suffix appended to titles found in Markdown documents
    pub title_suffix: String,

    /// Commit message used by the publish stage
    pub commit_message: String,

    /// Remote to push to (git's default when unset)
    pub remote: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("public"),
            clean: true,
            update: false,
            docs: true,
            auth: false,
            push: false,
            serve: None,
            api_token: None,
            on_collision: CollisionPolicy::Reject,
            default_title: "Home".to_string(),
            title_suffix: String::new(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            remote: None,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth && self.api_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ConfigError::MissingApiToken);
        }

        if same_dir(&self.work_dir, &self.output_dir) {
            return Err(ConfigError::OutputIsWorkDir(self.output_dir.clone()));
        }

        for dir in self.source_dirs() {
            if !dir.is_dir() {
                return Err(ConfigError::MissingSourceDir(dir));
            }
        }

        Ok(())
    }

    /// The content source tree.
    pub fn content_dir(&self) -> PathBuf {
        self.work_dir.join(CONTENT_DIR)
    }

    /// The page template tree.
    pub fn pages_dir(&self) -> PathBuf {
        self.work_dir.join(PAGES_DIR)
    }

    /// The shared fragment directory.
    pub fn templates_dir(&self) -> PathBuf {
        self.work_dir.join(TEMPLATES_DIR)
    }

    /// Every source tree a run reads, in stage order.
    pub fn source_dirs(&self) -> [PathBuf; 3] {
        [self.content_dir(), self.templates_dir(), self.pages_dir()]
    }

    /// The API token, only when authentication is enabled.
    pub fn token(&self) -> Option<&str> {
        if self.auth {
            self.api_token.as_deref()
        } else {
            None
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Parse a serve address.
///
/// An empty string means "do not serve". `:8080` listens on all interfaces.
pub fn parse_serve_addr(addr: &str) -> Result<Option<SocketAddr>, ConfigError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Ok(None);
    }

    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };

    if let Ok(parsed) = full.parse::<SocketAddr>() {
        return Ok(Some(parsed));
    }

    let invalid = |reason: String| ConfigError::InvalidServeAddr {
        addr: addr.to_string(),
        reason,
    };

    full.to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .map(Some)
        .ok_or_else(|| invalid("address resolved to nothing".to_string()))
}
