//! Rendering the pages tree.
//!
//! Every `*.tmpl` file under `pages/` is registered in the shared namespace
//! under its path-derived key and rendered to a matching `.html` file.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{io_err, walk_err, Result};
use crate::paths::{PathAliases, RenderTask, TEMPLATE_EXT};
use crate::templates::TemplateRegistry;

/// Why a discovered entry produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a `.tmpl` file
    NotTemplate,
    /// A directory or other non-regular entry
    NotRegular,
}

/// What happened to one entry of the pages tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Skipped(SkipReason),
    Rendered { key: String, output: PathBuf },
}

/// Renders page templates into the output tree.
pub struct PageRenderer<'a> {
    work_dir: &'a Path,
    output_dir: &'a Path,
    aliases: &'a PathAliases,
}

impl<'a> PageRenderer<'a> {
    pub fn new(work_dir: &'a Path, output_dir: &'a Path, aliases: &'a PathAliases) -> Self {
        Self {
            work_dir,
            output_dir,
            aliases,
        }
    }

    /// Walk `pages_dir` depth first in name order, rendering each page as it
    /// is found. Stops at the first failure. Returns the rendered outputs in
    /// walk order.
    pub fn render_all(
        &self,
        pages_dir: &Path,
        registry: &mut TemplateRegistry,
    ) -> Result<Vec<PathBuf>> {
        let mut outputs = Vec::new();

        for entry in WalkDir::new(pages_dir).sort_by_file_name() {
            let entry = entry.map_err(walk_err(pages_dir))?;
            if entry.file_type().is_dir() {
                continue;
            }

            if let PageOutcome::Rendered { output, .. } = self.render_one(entry.path(), registry)? {
                outputs.push(output);
            }
        }

        Ok(outputs)
    }

    /// Take one discovered path through extension check, open, parse,
    /// output directory creation and execution.
    pub fn render_one(&self, path: &Path, registry: &mut TemplateRegistry) -> Result<PageOutcome> {
        if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
            return Ok(PageOutcome::Skipped(SkipReason::NotTemplate));
        }

        let mut file = File::open(path).map_err(io_err("open", path))?;
        if !file.metadata().map_err(io_err("stat", path))?.is_file() {
            return Ok(PageOutcome::Skipped(SkipReason::NotRegular));
        }

        let mut source = String::new();
        file.read_to_string(&mut source)
            .map_err(io_err("read", path))?;

        let task = RenderTask::from_source(self.work_dir, path)?;
        let key = task.key();
        registry.register(&key, source, path)?;

        let output = task.output_path(self.output_dir);
        if let Some(dir) = output.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                tracing::error!("mkdir {}", self.aliases.show(dir));
                return Err(io_err("mkdir", dir)(e));
            }
        }

        tracing::info!("execute {} > {}", key, self.aliases.show(&output));
        let html = registry.render_empty(&key)?;
        fs::write(&output, html).map_err(io_err("create", &output))?;

        Ok(PageOutcome::Rendered { key, output })
    }
}
