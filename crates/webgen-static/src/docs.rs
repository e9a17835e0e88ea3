//! Package documentation.
//!
//! The pipeline calls a [`DocGenerator`] once per run. The built-in
//! [`ManifestDocs`] renders pages for the packages listed in `packages.toml`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use minijinja::{context, Value};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{io_err, PipelineError, Result};
use crate::paths::{PathAliases, OUTPUT_EXT};
use crate::templates::TemplateRegistry;

/// Manifest listing documented packages, relative to the working root.
pub const MANIFEST_FILE: &str = "packages.toml";

/// Template rendered once per package.
pub const PKG_DOC_TEMPLATE: &str = "pkgdoc";

/// Template rendered once for the package index.
pub const PKG_INDEX_TEMPLATE: &str = "pkgindex";

/// Output file of the package index, relative to the output root.
pub const PKG_INDEX_OUT: &str = "packages.html";

/// Everything a generator may use during a run.
pub struct DocContext<'a> {
    pub config: &'a PipelineConfig,
    pub registry: &'a TemplateRegistry,
    pub aliases: &'a PathAliases,
}

impl DocContext<'_> {
    /// Whether sources should be refreshed before generating.
    pub fn update(&self) -> bool {
        self.config.update
    }

    /// API token, when authentication is enabled.
    pub fn api_token(&self) -> Option<&str> {
        self.config.token()
    }
}

/// Produces package documentation into the output tree.
pub trait DocGenerator {
    /// Generate documentation. Returns the number of packages documented.
    fn generate(&self, ctx: &DocContext<'_>) -> Result<usize>;
}

/// A documented package.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Package {
    /// Import path, also the output directory
    pub path: String,

    /// Display name
    pub name: String,

    /// One line summary
    #[serde(default)]
    pub synopsis: Option<String>,

    /// Markdown file rendered as the package page body
    #[serde(default)]
    pub readme: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "package")]
    packages: Vec<Package>,
}

/// Renders `pkgdoc` per package and `pkgindex` for the index.
#[derive(Debug, Clone, Default)]
pub struct ManifestDocs;

impl ManifestDocs {
    /// Read the manifest, if the site has one.
    pub fn load(work_dir: &Path) -> Result<Option<Vec<Package>>> {
        let path = work_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path).map_err(io_err("read", &path))?;
        let manifest: Manifest = toml::from_str(&text).map_err(|e| PipelineError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        for package in &manifest.packages {
            let rel = Path::new(&package.path);
            let nested = rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
            if package.path.is_empty() || !nested {
                return Err(PipelineError::Manifest {
                    path,
                    reason: format!("package path {:?} must be a relative path", package.path),
                });
            }
        }

        Ok(Some(manifest.packages))
    }

    fn render_package(&self, ctx: &DocContext<'_>, package: &Package) -> Result<PathBuf> {
        let content = match &package.readme {
            Some(readme) => {
                let path = ctx.config.work_dir.join(readme);
                let source = fs::read_to_string(&path).map_err(io_err("read", &path))?;
                let doc = webgen_mdx::parse_markdown(&source)
                    .map_err(|source| PipelineError::Markdown { path, source })?;
                doc.to_html()
            }
            None => String::new(),
        };

        let html = ctx.registry.render(
            PKG_DOC_TEMPLATE,
            context! {
                title => format!("{}{}", package.name, ctx.config.title_suffix),
                package => package,
                content => Value::from_safe_string(content),
            },
        )?;

        let output = ctx
            .config
            .output_dir
            .join(&package.path)
            .join(format!("index.{OUTPUT_EXT}"));
        write(&output, html)?;
        tracing::info!("pkgdoc {} > {}", package.path, ctx.aliases.show(&output));

        Ok(output)
    }
}

impl DocGenerator for ManifestDocs {
    fn generate(&self, ctx: &DocContext<'_>) -> Result<usize> {
        let Some(packages) = Self::load(&ctx.config.work_dir)? else {
            tracing::debug!("no {} found, skipping package documentation", MANIFEST_FILE);
            return Ok(0);
        };

        if ctx.update() {
            tracing::debug!("{} sources are local, nothing to update", MANIFEST_FILE);
        }

        for package in &packages {
            self.render_package(ctx, package)?;
        }

        let html = ctx.registry.render(
            PKG_INDEX_TEMPLATE,
            context! {
                title => format!("Packages{}", ctx.config.title_suffix),
                packages => &packages,
            },
        )?;
        let output = ctx.config.output_dir.join(PKG_INDEX_OUT);
        write(&output, html)?;
        tracing::info!("pkgindex > {}", ctx.aliases.show(&output));

        Ok(packages.len())
    }
}

fn write(path: &Path, contents: String) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err("mkdir", dir))?;
    }
    fs::write(path, contents).map_err(io_err("create", path))
}
