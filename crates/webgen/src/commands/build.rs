//! Site build command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use webgen_server::StaticServer;
use webgen_static::{parse_serve_addr, Pipeline, PipelineConfig, RunReport, TOKEN_ENV};

use crate::config::{ConfigFile, DEFAULT_OUTPUT};

/// Flags of `webgen build`. Unset flags fall back to the config file.
#[derive(Debug, Default, Args)]
pub struct BuildArgs {
    /// Working root holding content/, pages/ and templates/
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory (defaults to config or "<root>/public")
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Keep existing files in the output directory
    #[arg(long)]
    pub no_clean: bool,

    /// Refresh documentation sources before generating
    #[arg(long)]
    pub update: bool,

    /// Skip package documentation
    #[arg(long)]
    pub no_docs: bool,

    /// Authenticate using $GITHUB_API_TOKEN
    #[arg(long)]
    pub auth: bool,

    /// Run git add, commit and push in the output directory afterwards
    #[arg(long)]
    pub push: bool,

    /// Serve the output over HTTP afterwards, e.g. :8080
    #[arg(long)]
    pub http: Option<String>,
}

/// Layer CLI flags over the config file.
pub fn resolve(args: BuildArgs, file: ConfigFile, token: Option<String>) -> Result<PipelineConfig> {
    let root = args
        .root
        .or_else(|| file.site.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let output = args
        .out
        .or_else(|| file.output_under(&root))
        .unwrap_or_else(|| root.join(DEFAULT_OUTPUT));

    let serve = args.http.unwrap_or(file.build.serve);
    let serve = parse_serve_addr(&serve)?;

    Ok(PipelineConfig {
        work_dir: root,
        output_dir: output,
        clean: file.build.clean && !args.no_clean,
        update: file.build.update || args.update,
        docs: file.build.docs && !args.no_docs,
        auth: file.build.auth || args.auth,
        push: file.build.push || args.push,
        serve,
        api_token: token,
        on_collision: file.templates.on_collision,
        default_title: file.site.default_title,
        title_suffix: file.site.title_suffix,
        commit_message: file.publish.message,
        remote: file.publish.remote,
    })
}

/// Run the build command.
pub async fn run(args: BuildArgs, file: ConfigFile) -> Result<()> {
    tracing::info!("Building site...");

    let token = std::env::var(TOKEN_ENV).ok();
    let config = resolve(args, file, token)?;
    let serve = config.serve;

    let pipeline = Pipeline::new(config);
    let report = tokio::task::block_in_place(|| pipeline.execute())?;
    log_report(&report);

    if let Some(addr) = serve {
        StaticServer::new(&report.output_dir)?
            .serve(addr)
            .await
            .with_context(|| format!("Failed to serve {}", report.output_dir.display()))?;
    }

    Ok(())
}

fn log_report(report: &RunReport) {
    tracing::info!(
        "Rendered {} pages, {} articles, {} doc pages and {} packages in {}ms",
        report.pages,
        report.articles,
        report.doc_pages,
        report.packages,
        report.duration_ms
    );
    tracing::info!(
        "Copied {} files in {} directories, removed {} entries",
        report.copied_files,
        report.copied_dirs,
        report.removed
    );

    if let Some(publish) = &report.publish {
        if publish.is_clean() {
            tracing::info!("Published");
        } else {
            tracing::warn!("Publish finished with {} failed steps", publish.failures.len());
        }
    }

    tracing::info!("Output: {}", report.output_dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use webgen_static::CollisionPolicy;

    #[test]
    fn defaults_without_flags_or_file() {
        let config = resolve(BuildArgs::default(), ConfigFile::default(), None).unwrap();

        assert_eq!(config.work_dir, PathBuf::from("."));
        assert_eq!(config.output_dir, PathBuf::from("./public"));
        assert!(config.clean);
        assert!(config.docs);
        assert!(!config.update);
        assert!(!config.auth);
        assert!(!config.push);
        assert_eq!(config.serve, None);
        assert_eq!(config.on_collision, CollisionPolicy::Reject);
    }

    #[test]
    fn flags_override_file() {
        let file = ConfigFile::parse(
            r#"
[site]
root = "site"
output = "out"

[build]
serve = ":8080"
"#,
        )
        .unwrap();
        let args = BuildArgs {
            out: Some(PathBuf::from("/tmp/www")),
            no_clean: true,
            no_docs: true,
            push: true,
            http: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        };

        let config = resolve(args, file, None).unwrap();

        assert_eq!(config.work_dir, PathBuf::from("site"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/www"));
        assert!(!config.clean);
        assert!(!config.docs);
        assert!(config.push);
        assert_eq!(config.serve, Some("127.0.0.1:9000".parse::<SocketAddr>().unwrap()));
    }

    #[test]
    fn file_settings_apply_when_flags_are_unset() {
        let file = ConfigFile::parse(
            r#"
[site]
root = "site"
output = "out"
title_suffix = " - Site"

[build]
update = true
serve = ":8080"

[publish]
remote = "origin"
"#,
        )
        .unwrap();

        let config = resolve(BuildArgs::default(), file, None).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("site/out"));
        assert!(config.update);
        assert_eq!(config.serve.map(|a| a.port()), Some(8080));
        assert_eq!(config.title_suffix, " - Site");
        assert_eq!(config.remote.as_deref(), Some("origin"));
    }

    #[test]
    fn bad_serve_address_is_rejected() {
        let args = BuildArgs {
            http: Some("nowhere".to_string()),
            ..Default::default()
        };
        assert!(resolve(args, ConfigFile::default(), None).is_err());
    }

    #[test]
    fn auth_without_token_fails_validation() {
        let args = BuildArgs {
            auth: true,
            ..Default::default()
        };
        let config = resolve(args, ConfigFile::default(), None).unwrap();
        assert!(config.validate().is_err());
    }
}
