//! Wrapper around the external `git` executable
//!
//! Every git invocation goes through [`GitTool::run`], which captures stderr
//! so failures surface as [`ScaffoldError::GitCommandFailed`] instead of
//! leaking to the terminal.

use crate::error::{Result, ScaffoldError};
use crate::templates::fetcher::{CloneBackend, CloneStrategy};
use crate::templates::version::parse_git_version;
use semver::Version;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;

/// Configuration for the git tool
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Name or path of the git binary
    pub program: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

/// Runs git subcommands for template cloning
#[derive(Debug, Clone, Default)]
pub struct GitTool {
    config: ToolConfig,
}

impl GitTool {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Get the installed git version (if available)
    pub async fn get_version(&self) -> Result<Option<Version>> {
        let output = TokioCommand::new(&self.config.program)
            .arg("--version")
            .output()
            .await
            .map_err(|e| ScaffoldError::VcsUnavailable(format!("{}: {}", self.config.program, e)))?;

        if !output.status.success() {
            return Err(ScaffoldError::VcsUnavailable(format!(
                "`{} --version` exited with {}",
                self.config.program, output.status
            )));
        }
        Ok(parse_git_version(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Run a git subcommand, optionally inside `cwd`
    pub async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        let command = args.join(" ");
        tracing::debug!(%command, "running git");

        let mut cmd = TokioCommand::new(&self.config.program);
        if let Some(dir) = cwd {
            cmd.arg("-C").arg(dir);
        }
        let output = cmd
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ScaffoldError::GitCommandFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ScaffoldError::GitCommandFailed {
                command,
                message: if stderr.is_empty() {
                    format!("exited with {}", output.status)
                } else {
                    stderr
                },
            })
        }
    }
}

impl CloneBackend for GitTool {
    async fn probe(&self) -> Result<Option<Version>> {
        self.get_version().await
    }

    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        strategy: CloneStrategy,
        subdir: &str,
    ) -> Result<()> {
        let dest_str = dest.to_string_lossy();
        match strategy {
            CloneStrategy::Full => {
                self.run(None, &["clone", "--depth", "1", url, &dest_str])
                    .await
            }
            CloneStrategy::Optimized => {
                self.run(
                    None,
                    &[
                        "clone",
                        "--depth",
                        "1",
                        "--filter=blob:none",
                        "--sparse",
                        url,
                        &dest_str,
                    ],
                )
                .await?;
                self.run(Some(dest), &["sparse-checkout", "set", subdir])
                    .await
            }
        }
    }

    async fn checkout_ref(&self, dest: &Path, git_ref: &str, strategy: CloneStrategy) -> Result<()> {
        match strategy {
            CloneStrategy::Full => {
                self.run(Some(dest), &["fetch", "--depth", "1", "origin", git_ref])
                    .await?
            }
            CloneStrategy::Optimized => {
                self.run(
                    Some(dest),
                    &["fetch", "--depth", "1", "--filter=blob:none", "origin", git_ref],
                )
                .await?
            }
        }
        self.run(Some(dest), &["checkout", "FETCH_HEAD"]).await
    }
}
