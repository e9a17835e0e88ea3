//! Rendering Markdown documents through a named template.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{context, Value};
use walkdir::WalkDir;
use wax::{CandidatePath, Glob, Pattern};
use webgen_mdx::{parse_markdown, ParsedDoc};

use crate::config::PipelineConfig;
use crate::error::{io_err, walk_err, PipelineError, Result};
use crate::paths::{relative, to_slash, PathAliases, OUTPUT_EXT};
use crate::templates::TemplateRegistry;

/// Patterns for site articles.
pub const ARTICLE_PATTERNS: &[&str] = &["*.md", "news/*.md", "news/*/*.md"];

/// Patterns for documentation pages.
pub const DOC_PATTERNS: &[&str] = &["doc/*.md", "doc/*/*.md"];

/// A glob matched against `/`-separated paths relative to the working root.
///
/// `*` matches any run of characters within one segment and `?` matches a
/// single character. Tree wildcards (`**`) are not accepted.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    glob: Glob<'static>,
    depth: usize,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| PipelineError::Glob {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("empty pattern".to_string()));
        }
        if pattern.starts_with('/') {
            return Err(invalid("must be relative".to_string()));
        }
        if pattern.contains("**") {
            return Err(invalid("** is not supported".to_string()));
        }
        if pattern.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
            return Err(invalid("empty, . or .. segment".to_string()));
        }

        let glob = Glob::new(pattern)
            .map_err(|e| invalid(e.to_string()))?
            .into_owned();

        Ok(Self {
            pattern: pattern.to_string(),
            glob,
            depth: pattern.split('/').count(),
        })
    }

    /// Whether a relative `/`-separated path matches.
    pub fn matches(&self, rel: &str) -> bool {
        self.glob.is_match(CandidatePath::from(rel))
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Number of path segments the pattern spans.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// One class of documents rendered through one template.
#[derive(Debug, Clone)]
pub struct MarkdownJob {
    /// Name used in logs
    pub label: String,
    /// Patterns, in priority order
    pub patterns: Vec<String>,
    /// Logical name of the template to render through
    pub template: String,
    /// Use the first heading as title when the frontmatter has none
    pub derive_titles: bool,
}

impl MarkdownJob {
    pub fn new(label: &str, patterns: &[&str], template: &str) -> Self {
        Self {
            label: label.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            template: template.to_string(),
            derive_titles: false,
        }
    }

    /// Site articles, rendered through `article`.
    pub fn articles() -> Self {
        Self::new("articles", ARTICLE_PATTERNS, "article")
    }

    /// Documentation pages, rendered through `doc`.
    pub fn docs() -> Self {
        Self::new("docs", DOC_PATTERNS, "doc")
    }

    pub fn with_derived_titles(mut self, derive: bool) -> Self {
        self.derive_titles = derive;
        self
    }
}

/// Pick the page title for a document.
pub fn resolve_title(doc: &ParsedDoc, derive: bool, config: &PipelineConfig) -> String {
    let found = match doc.declared_title() {
        Some(title) => Some(title),
        None if derive => doc.first_heading(),
        None => None,
    };

    match found {
        Some(title) => format!("{title}{}", config.title_suffix),
        None => config.default_title.clone(),
    }
}

/// Renders Markdown documents matched by a [`MarkdownJob`].
pub struct MarkdownPipeline<'a> {
    config: &'a PipelineConfig,
    registry: &'a TemplateRegistry,
    aliases: &'a PathAliases,
}

impl<'a> MarkdownPipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        registry: &'a TemplateRegistry,
        aliases: &'a PathAliases,
    ) -> Self {
        Self {
            config,
            registry,
            aliases,
        }
    }

    /// Documents matched by `job`, relative to the working root, ordered by
    /// pattern then by name. Each document appears once.
    pub fn find(&self, job: &MarkdownJob) -> Result<Vec<PathBuf>> {
        let patterns = job
            .patterns
            .iter()
            .map(|p| GlobPattern::new(p))
            .collect::<Result<Vec<_>>>()?;
        let Some(max_depth) = patterns.iter().map(GlobPattern::depth).max() else {
            return Ok(Vec::new());
        };

        let work = self.config.work_dir.as_path();
        let out = self.config.output_dir.as_path();
        // The output tree as the walk would spell it, when it sits under work.
        let out_in_work = match (work.canonicalize(), out.canonicalize()) {
            (Ok(w), Ok(o)) => o.strip_prefix(&w).ok().map(|rel| work.join(rel)),
            _ => None,
        };

        let mut candidates = Vec::new();
        let walker = WalkDir::new(work)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != out && Some(e.path()) != out_in_work.as_deref());
        for entry in walker {
            let entry = entry.map_err(walk_err(work))?;
            if !entry.path().is_file() {
                continue;
            }
            let rel = relative(work, entry.path())?.to_path_buf();
            candidates.push((to_slash(&rel), rel));
        }

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for pattern in &patterns {
            for (slash, rel) in &candidates {
                if pattern.matches(slash) && seen.insert(rel.clone()) {
                    matched.push(rel.clone());
                }
            }
        }

        Ok(matched)
    }

    /// Render every document of `job`. Returns the number rendered.
    pub fn run(&self, job: &MarkdownJob) -> Result<usize> {
        let docs = self.find(job)?;
        tracing::debug!("{}: {} documents", job.label, docs.len());

        for rel in &docs {
            self.render(job, rel)?;
        }

        Ok(docs.len())
    }

    /// Render one document, given relative to the working root.
    pub fn render(&self, job: &MarkdownJob, rel: &Path) -> Result<PathBuf> {
        let source_path = self.config.work_dir.join(rel);
        let source = fs::read_to_string(&source_path).map_err(io_err("read", &source_path))?;
        let doc = parse_markdown(&source).map_err(|source| PipelineError::Markdown {
            path: source_path.clone(),
            source,
        })?;

        let out_rel = rel.with_extension(OUTPUT_EXT);
        let output = self.config.output_dir.join(&out_rel);

        let html = self.registry.render(
            &job.template,
            context! {
                title => resolve_title(&doc, job.derive_titles, self.config),
                description => doc.description(),
                content => Value::from_safe_string(doc.to_html()),
                toc => &doc.toc,
                path => format!("/{}", to_slash(&out_rel)),
                source => to_slash(rel),
            },
        )?;

        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir).map_err(io_err("mkdir", dir))?;
        }
        tracing::info!(
            "markdown {} > {}",
            self.aliases.show(&source_path),
            self.aliases.show(&output)
        );
        fs::write(&output, html).map_err(io_err("create", &output))?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionPolicy;
    use crate::helpers::HelperSet;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct Site {
        _temp: tempfile::TempDir,
        config: PipelineConfig,
        aliases: PathAliases,
        registry: TemplateRegistry,
    }

    impl Site {
        fn new() -> Self {
            let temp = tempdir().unwrap();
            let work = temp.path().join("site");
            fs::create_dir_all(&work).unwrap();
            let config = PipelineConfig {
                work_dir: work.clone(),
                output_dir: work.join("public"),
                default_title: "Azul3D".to_string(),
                title_suffix: " - Azul3D".to_string(),
                ..Default::default()
            };
            let aliases = PathAliases::new(&config.work_dir, &config.output_dir);
            let mut registry = TemplateRegistry::new(&HelperSet::builtin(), CollisionPolicy::Reject);
            registry
                .register(
                    "article",
                    "<title>{{ title }}</title>{{ content }}".into(),
                    Path::new("article.tmpl"),
                )
                .unwrap();
            registry
                .register(
                    "doc",
                    "{{ title }}|{{ path|safe }}|{{ source|safe }}|{% for e in toc %}{{ e.id }};{% endfor %}"
                        .into(),
                    Path::new("doc.tmpl"),
                )
                .unwrap();
            Self {
                _temp: temp,
                config,
                aliases,
                registry,
            }
        }

        fn doc(&self, rel: &str, body: &str) {
            let path = self.config.work_dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        fn pipeline(&self) -> MarkdownPipeline<'_> {
            MarkdownPipeline::new(&self.config, &self.registry, &self.aliases)
        }

        fn read_out(&self, rel: &str) -> String {
            fs::read_to_string(self.config.output_dir.join(rel)).unwrap()
        }
    }

    #[test]
    fn glob_matches_within_one_segment() {
        let glob = GlobPattern::new("news/*.md").unwrap();

        assert!(glob.matches("news/release.md"));
        assert!(!glob.matches("news/2014/release.md"));
        assert!(!glob.matches("news/release.markdown"));
        assert!(!glob.matches("other/news/release.md"));
        assert_eq!(glob.depth(), 2);
    }

    #[test]
    fn glob_treats_other_characters_literally() {
        let glob = GlobPattern::new("a+b?.md").unwrap();

        assert!(glob.matches("a+bc.md"));
        assert!(!glob.matches("aabc.md"));
        assert!(!glob.matches("a+b/.md"));
    }

    #[test]
    fn glob_rejects_bad_patterns() {
        for bad in ["", "/abs/*.md", "**/*.md", "a//b", "../*.md"] {
            assert!(GlobPattern::new(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn finds_articles_in_pattern_order() {
        let site = Site::new();
        site.doc("zeta.md", "z");
        site.doc("about.md", "a");
        site.doc("news/2014/first.md", "f");
        site.doc("news/intro.md", "i");
        site.doc("news/2014/deep/too-deep.md", "d");
        site.doc("doc/install.md", "not an article");
        site.doc("notes.txt", "no");

        let found = site.pipeline().find(&MarkdownJob::articles()).unwrap();

        assert_eq!(
            found,
            vec![
                PathBuf::from("about.md"),
                PathBuf::from("zeta.md"),
                PathBuf::from("news/intro.md"),
                PathBuf::from("news/2014/first.md"),
            ]
        );
    }

    #[test]
    fn overlapping_patterns_render_once() {
        let site = Site::new();
        site.doc("doc/a.md", "a");

        let job = MarkdownJob::new("docs", &["doc/*.md", "doc/a.md"], "doc");
        let found = site.pipeline().find(&job).unwrap();

        assert_eq!(found, vec![PathBuf::from("doc/a.md")]);
    }

    #[test]
    fn output_dir_is_not_scanned() {
        let site = Site::new();
        site.doc("public/stale.md", "old output");
        site.doc("doc/a.md", "a");

        let job = MarkdownJob::new("all", &["*/*.md"], "doc");
        let found = site.pipeline().find(&job).unwrap();

        assert_eq!(found, vec![PathBuf::from("doc/a.md")]);
    }

    #[test]
    fn renders_docs_under_mirrored_path() {
        let site = Site::new();
        site.doc(
            "doc/gfx/shaders.md",
            "---\ntitle: Shaders\n---\n# Writing shaders\n\n## Uniforms\n",
        );

        let count = site.pipeline().run(&MarkdownJob::docs()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            site.read_out("doc/gfx/shaders.html"),
            "Shaders - Azul3D|/doc/gfx/shaders.html|doc/gfx/shaders.md|writing-shaders;uniforms;"
        );
    }

    #[test]
    fn renders_article_content() {
        let site = Site::new();
        site.doc("news/launch.md", "---\ntitle: Launch\n---\nWe **shipped**.");

        site.pipeline().run(&MarkdownJob::articles()).unwrap();

        assert_eq!(
            site.read_out("news/launch.html"),
            "<title>Launch - Azul3D</title><p>We <strong>shipped</strong>.</p>\n"
        );
    }

    #[test]
    fn title_falls_back_to_default() {
        let site = Site::new();
        site.doc("index.md", "# Welcome\n");

        site.pipeline().run(&MarkdownJob::articles()).unwrap();

        assert!(site.read_out("index.html").starts_with("<title>Azul3D</title>"));
    }

    #[test]
    fn title_derived_from_heading_when_enabled() {
        let site = Site::new();
        site.doc("index.md", "# Welcome\n");

        let job = MarkdownJob::articles().with_derived_titles(true);
        site.pipeline().run(&job).unwrap();

        assert!(site
            .read_out("index.html")
            .starts_with("<title>Welcome - Azul3D</title>"));
    }

    #[test]
    fn missing_template_is_fatal() {
        let site = Site::new();
        site.doc("doc/a.md", "a");

        let job = MarkdownJob::new("docs", DOC_PATTERNS, "reference");

        assert!(matches!(
            site.pipeline().run(&job),
            Err(PipelineError::Template { .. })
        ));
    }

    #[test]
    fn bad_frontmatter_is_fatal() {
        let site = Site::new();
        site.doc("doc/a.md", "---\ntitle: [oops\n---\n");

        assert!(matches!(
            site.pipeline().run(&MarkdownJob::docs()),
            Err(PipelineError::Markdown { .. })
        ));
    }

    #[test]
    fn no_matches_is_fine() {
        let site = Site::new();
        assert_eq!(site.pipeline().run(&MarkdownJob::docs()).unwrap(), 0);
    }
}
