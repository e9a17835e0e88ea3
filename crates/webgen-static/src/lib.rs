//! Static site generation pipeline.
//!
//! Assembles an output tree from a working root holding `content/` (copied
//! verbatim), `pages/` (page templates), `templates/` (shared fragments) and
//! Markdown documents, then optionally commits and pushes the result.

pub mod clean;
pub mod config;
pub mod copy;
pub mod docs;
pub mod error;
pub mod helpers;
pub mod markdown;
pub mod pages;
pub mod paths;
pub mod pipeline;
pub mod publish;
pub mod templates;

pub use config::{parse_serve_addr, CollisionPolicy, ConfigError, PipelineConfig, TOKEN_ENV};
pub use docs::{DocContext, DocGenerator, ManifestDocs, Package};
pub use error::{PipelineError, Result};
pub use helpers::{HelperError, HelperFn, HelperSet};
pub use markdown::{MarkdownJob, MarkdownPipeline};
pub use pipeline::{Pipeline, RunReport};
pub use publish::{GitPublisher, PublishError, PublishReport, PublishStep};
pub use templates::TemplateRegistry;
