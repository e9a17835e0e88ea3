//! The shared template namespace.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::config::CollisionPolicy;
use crate::error::{io_err, template_err, PipelineError, Result};
use crate::helpers::HelperSet;
use crate::paths::TEMPLATE_EXT;

/// Every template of a run, keyed by logical name.
///
/// Fragments and pages live in one namespace so that any template can
/// include any other by name.
pub struct TemplateRegistry {
    env: Environment<'static>,
    origins: BTreeMap<String, PathBuf>,
    policy: CollisionPolicy,
}

impl TemplateRegistry {
    /// Create an empty registry with `helpers` installed.
    pub fn new(helpers: &HelperSet, policy: CollisionPolicy) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        helpers.install(&mut env);

        Self {
            env,
            origins: BTreeMap::new(),
            policy,
        }
    }

    /// Parse every `*.tmpl` file directly inside `dir` as a shared fragment
    /// named after its file stem. Returns the number of fragments loaded.
    pub fn load_fragments(&mut self, dir: &Path) -> Result<usize> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err("read dir", dir))? {
            let entry = entry.map_err(io_err("read dir", dir))?;
            paths.push(entry.path());
        }
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
                continue;
            }
            if !fs::metadata(&path).map_err(io_err("stat", &path))?.is_file() {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let name = name.to_string();
            let source = fs::read_to_string(&path).map_err(io_err("read", &path))?;

            tracing::debug!("parse fragment {}", name);
            self.register(&name, source, &path)?;
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Parse `source` under `name`. `origin` is reported on collisions.
    pub fn register(&mut self, name: &str, source: String, origin: &Path) -> Result<()> {
        if let Some(existing) = self.origins.get(name) {
            match self.policy {
                CollisionPolicy::Reject => {
                    return Err(PipelineError::Collision {
                        name: name.to_string(),
                        existing: existing.clone(),
                        incoming: origin.to_path_buf(),
                    });
                }
                CollisionPolicy::Replace => {
                    tracing::warn!(
                        "template {} from {} replaces {}",
                        name,
                        origin.display(),
                        existing.display()
                    );
                }
            }
        }

        self.env
            .add_template_owned(name.to_string(), source)
            .map_err(template_err(name))?;
        self.origins.insert(name.to_string(), origin.to_path_buf());

        Ok(())
    }

    /// Whether a template with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.origins.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.origins.keys().map(String::as_str)
    }

    /// Render a template against `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(template_err(name))
    }

    /// Render a template with no data.
    pub fn render_empty(&self, name: &str) -> Result<String> {
        self.render(name, context! {})
    }
}
