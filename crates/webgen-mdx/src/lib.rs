//! Markdown document model for webgen.
//!
//! This crate parses Markdown documents, extracts YAML frontmatter and the
//! heading outline, and renders the body to HTML.

pub mod frontmatter;
pub mod parser;

pub use frontmatter::{Frontmatter, FrontmatterError};
pub use parser::{parse_markdown, render_html, slugify, ParseError, ParsedDoc, TocEntry};
