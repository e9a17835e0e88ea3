//! Committing and pushing the output tree.
//!
//! Publishing is best effort: every step runs even if an earlier one
//! failed, and failures are reported rather than returned.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::PipelineConfig;

/// Commit message used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Automatic commit by webgen command line tool.";

/// One git invocation of the publish stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Add,
    Commit,
    Push,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PublishStep::Add => "add",
            PublishStep::Commit => "commit",
            PublishStep::Push => "push",
        })
    }
}

/// A failed publish step. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("git {step}: could not run git: {source}")]
    Spawn {
        step: PublishStep,
        #[source]
        source: std::io::Error,
    },

    #[error("git {step}: {status}: {stderr}")]
    Failed {
        step: PublishStep,
        status: ExitStatus,
        stderr: String,
    },
}

impl PublishError {
    pub fn step(&self) -> PublishStep {
        match self {
            PublishError::Spawn { step, .. } | PublishError::Failed { step, .. } => *step,
        }
    }
}

/// Outcome of a publish attempt.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub failures: Vec<PublishError>,
}

impl PublishReport {
    /// True when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_steps(&self) -> Vec<PublishStep> {
        self.failures.iter().map(PublishError::step).collect()
    }
}

/// Runs `git add`, `git commit` and `git push` inside a repository.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    repo: PathBuf,
    message: String,
    remote: Option<String>,
}

impl GitPublisher {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            remote: None,
        }
    }

    /// Publisher for the output directory of `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            repo: config.output_dir.clone(),
            message: config.commit_message.clone(),
            remote: config.remote.clone(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// `git add -A`
    pub fn add_all(&self) -> Result<(), PublishError> {
        self.git(PublishStep::Add, &["add", "-A"])
    }

    /// `git commit -am <message>`
    pub fn commit_all(&self) -> Result<(), PublishError> {
        self.git(PublishStep::Commit, &["commit", "-am", &self.message])
    }

    /// `git push [remote]`
    pub fn push(&self) -> Result<(), PublishError> {
        let mut args = vec!["push"];
        if let Some(remote) = &self.remote {
            args.push(remote);
        }
        self.git(PublishStep::Push, &args)
    }

    /// Run all three steps, logging each failure.
    pub fn publish(&self) -> PublishReport {
        tracing::info!("Pushing changes to remote...");
        tracing::info!("    Repo Root: {}", self.repo.display());

        let mut report = PublishReport::default();
        for result in [self.add_all(), self.commit_all(), self.push()] {
            if let Err(e) = result {
                tracing::warn!("    {}", e);
                report.failures.push(e);
            }
        }
        report
    }

    fn git(&self, step: PublishStep, args: &[&str]) -> Result<(), PublishError> {
        tracing::debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .output()
            .map_err(|source| PublishError::Spawn { step, source })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(PublishError::Failed {
                step,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn failures_do_not_stop_later_steps() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("not-created");

        let report = GitPublisher::new(&missing).publish();

        assert!(!report.is_clean());
        assert_eq!(
            report.failed_steps(),
            vec![PublishStep::Add, PublishStep::Commit, PublishStep::Push]
        );
    }

    #[test]
    fn takes_settings_from_config() {
        let config = PipelineConfig {
            output_dir: PathBuf::from("/srv/site"),
            commit_message: "rebuild".to_string(),
            remote: Some("origin".to_string()),
            ..Default::default()
        };

        let publisher = GitPublisher::from_config(&config);

        assert_eq!(publisher.repo(), Path::new("/srv/site"));
        assert_eq!(publisher.message, "rebuild");
        assert_eq!(publisher.remote.as_deref(), Some("origin"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let publisher = GitPublisher::new("/srv/site")
            .with_message("deploy")
            .with_remote("upstream");

        assert_eq!(publisher.message, "deploy");
        assert_eq!(publisher.remote.as_deref(), Some("upstream"));
    }

    #[test]
    fn step_names() {
        assert_eq!(PublishStep::Add.to_string(), "add");
        assert_eq!(PublishStep::Commit.to_string(), "commit");
        assert_eq!(PublishStep::Push.to_string(), "push");
    }
}
