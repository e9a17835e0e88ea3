//! Configuration file structure (webgen.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use webgen_static::publish::DEFAULT_COMMIT_MESSAGE;
use webgen_static::CollisionPolicy;

/// Output directory name used when neither the file nor the CLI sets one.
pub const DEFAULT_OUTPUT: &str = "public";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub publish: PublishSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Working root
    pub root: Option<PathBuf>,
    /// Output directory
    pub output: Option<PathBuf>,
    #[serde(default = "default_title")]
    pub default_title: String,
    #[serde(default)]
    pub title_suffix: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            root: None,
            output: None,
            default_title: default_title(),
            title_suffix: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_true")]
    pub clean: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default = "default_true")]
    pub docs: bool,
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub push: bool,
    /// Address to serve on after building, e.g. ":8080"
    #[serde(default)]
    pub serve: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            clean: true,
            update: false,
            docs: true,
            auth: false,
            push: false,
            serve: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TemplatesSection {
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
    #[serde(default = "default_message")]
    pub message: String,
    pub remote: Option<String>,
}

impl Default for PublishSection {
    fn default() -> Self {
        Self {
            message: default_message(),
            remote: None,
        }
    }
}

fn default_title() -> String {
    "Home".to_string()
}
fn default_true() -> bool {
    true
}
fn default_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Output directory set by the file, resolved against `root` when relative.
    pub fn output_under(&self, root: &Path) -> Option<PathBuf> {
        self.site.output.as_ref().map(|out| root.join(out))
    }
}
