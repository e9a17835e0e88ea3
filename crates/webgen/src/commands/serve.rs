//! Serve command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use webgen_server::StaticServer;
use webgen_static::parse_serve_addr;

use crate::config::{ConfigFile, DEFAULT_OUTPUT};

/// Run the serve command.
pub async fn run(addr: &str, dir: Option<PathBuf>, file: ConfigFile) -> Result<()> {
    let root = file.site.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let dir = dir
        .or_else(|| file.output_under(&root))
        .unwrap_or_else(|| root.join(DEFAULT_OUTPUT));

    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {}. Run 'webgen build' first.",
            dir.display()
        );
    }

    let Some(addr) = parse_serve_addr(addr)? else {
        anyhow::bail!("No address to serve on");
    };

    StaticServer::new(&dir)?
        .serve(addr)
        .await
        .with_context(|| format!("Failed to serve {}", dir.display()))?;

    Ok(())
}
