//! One end-to-end generation run.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::clean::clean_tree;
use crate::config::PipelineConfig;
use crate::copy::{copy_tree, CopyStats};
use crate::docs::{DocContext, DocGenerator, ManifestDocs};
use crate::error::{io_err, Result};
use crate::helpers::HelperSet;
use crate::markdown::{MarkdownJob, MarkdownPipeline};
use crate::pages::PageRenderer;
use crate::paths::PathAliases;
use crate::publish::{GitPublisher, PublishReport};
use crate::templates::TemplateRegistry;

/// Result of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Entries removed from the output directory
    pub removed: usize,

    /// Directories copied from the content tree
    pub copied_dirs: usize,

    /// Files copied from the content tree
    pub copied_files: usize,

    /// Pages rendered
    pub pages: usize,

    /// Packages documented
    pub packages: usize,

    /// Markdown articles rendered
    pub articles: usize,

    /// Markdown doc pages rendered
    pub doc_pages: usize,

    /// Publish outcome, when publishing was requested
    pub publish: Option<PublishReport>,

    /// Total run time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Runs the stages in order: clean, copy, fragments, pages, package docs,
/// articles, doc pages.
pub struct Pipeline {
    config: PipelineConfig,
    helpers: HelperSet,
    docs: Box<dyn DocGenerator>,
    aliases: PathAliases,
}

impl Pipeline {
    /// Create a pipeline with the built-in helpers and [`ManifestDocs`].
    pub fn new(config: PipelineConfig) -> Self {
        let aliases = PathAliases::new(&config.work_dir, &config.output_dir);
        Self {
            config,
            helpers: HelperSet::builtin(),
            docs: Box::new(ManifestDocs),
            aliases,
        }
    }

    /// Swap in another documentation generator.
    pub fn with_doc_generator(mut self, docs: impl DocGenerator + 'static) -> Self {
        self.docs = Box::new(docs);
        self
    }

    /// Swap in another helper set.
    pub fn with_helpers(mut self, helpers: HelperSet) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the site. The first fatal error aborts the run; whatever was
    /// already written stays in place.
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let config = &self.config;
        config.validate()?;

        tracing::info!("WORK = {}", config.work_dir.display());
        tracing::info!("OUT = {}", config.output_dir.display());

        let mut report = RunReport {
            output_dir: config.output_dir.clone(),
            ..Default::default()
        };

        if config.clean {
            tracing::info!("rm -rf $OUT");
            report.removed = clean_tree(&config.output_dir)?;
        }
        fs::create_dir_all(&config.output_dir).map_err(io_err("mkdir", &config.output_dir))?;

        let content = config.content_dir();
        let CopyStats { dirs, files, .. } =
            copy_tree(&config.work_dir, &content, &config.output_dir, &self.aliases)?;
        report.copied_dirs = dirs;
        report.copied_files = files;

        let mut registry = TemplateRegistry::new(&self.helpers, config.on_collision);
        let loaded = registry.load_fragments(&config.templates_dir())?;
        tracing::debug!("{} shared fragments", loaded);

        let renderer = PageRenderer::new(&config.work_dir, &config.output_dir, &self.aliases);
        report.pages = renderer.render_all(&config.pages_dir(), &mut registry)?.len();

        if config.docs {
            report.packages = self.docs.generate(&DocContext {
                config,
                registry: &registry,
                aliases: &self.aliases,
            })?;
        }

        let markdown = MarkdownPipeline::new(config, &registry, &self.aliases);
        report.articles = markdown.run(&MarkdownJob::articles())?;
        report.doc_pages = markdown.run(&MarkdownJob::docs())?;

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// [`run`](Self::run), then publish the output when configured to.
    /// Publish failures are recorded in the report, never returned.
    pub fn execute(&self) -> Result<RunReport> {
        let mut report = self.run()?;
        if self.config.push {
            report.publish = Some(GitPublisher::from_config(&self.config).publish());
        }
        Ok(report)
    }
}
