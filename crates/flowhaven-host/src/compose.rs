//! Docker runtime and compose plugin wrapper
//!
//! The runtime is consumed strictly through its CLI contract
//! (`pull`, `up -d`, `down`, `ps --format json`); reconciliation of a
//! partially-running stack is compose's own job.

use crate::error::{HostError, Result};
use crate::runner::CommandRunner;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Vendor convenience installer for the runtime + compose plugin
pub const DOCKER_INSTALL_SCRIPT: &str = "curl -fsSL https://get.docker.com | sh";

/// Docker runtime wrapper
pub struct Docker<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Docker<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Check if the runtime is already installed
    pub async fn is_installed(&self) -> Result<bool> {
        self.runner.is_on_path("docker").await
    }

    /// Install runtime + compose plugin via the vendor script
    pub async fn install(&self) -> Result<()> {
        let output = self.runner.run_shell(DOCKER_INSTALL_SCRIPT).await?;
        if !output.success {
            return Err(HostError::RuntimeInstallFailed(output.stderr));
        }
        Ok(())
    }
}

/// Compose wrapper bound to one project directory
pub struct Compose<'a> {
    runner: &'a dyn CommandRunner,
    project_dir: PathBuf,
}

impl<'a> Compose<'a> {
    pub fn new(runner: &'a dyn CommandRunner, project_dir: &Path) -> Self {
        Self {
            runner,
            project_dir: project_dir.to_path_buf(),
        }
    }

    async fn run_compose(&self, args: &[&str]) -> Result<String> {
        let dir = self.project_dir.display().to_string();
        let mut full = vec!["compose", "--project-directory", dir.as_str()];
        full.extend_from_slice(args);
        self.runner.run_checked("docker", &full).await
    }

    /// Pull the latest images for all declared services
    pub async fn pull(&self) -> Result<()> {
        self.run_compose(&["pull"]).await?;
        Ok(())
    }

    /// Start (or update in place) the full stack, detached
    pub async fn up_detached(&self) -> Result<()> {
        self.run_compose(&["up", "-d"]).await?;
        Ok(())
    }

    /// Stop and remove the stack's containers (data volumes are kept)
    pub async fn down(&self) -> Result<()> {
        self.run_compose(&["down"]).await?;
        Ok(())
    }

    /// List services with their state
    pub async fn ps(&self) -> Result<Vec<ComposeService>> {
        let output = self.run_compose(&["ps", "--all", "--format", "json"]).await?;
        parse_ps_output(&output)
    }
}

/// One row of `docker compose ps --format json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeService {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Service")]
    pub service: Option<String>,

    #[serde(rename = "State")]
    pub state: Option<String>,

    #[serde(rename = "Status")]
    pub status: Option<String>,

    #[serde(rename = "Image")]
    pub image: Option<String>,
}

impl ComposeService {
    /// Check if the service is running
    pub fn is_running(&self) -> bool {
        self.state.as_deref() == Some("running")
    }
}

/// Parse compose ps output: a JSON array, or one JSON object per line
/// depending on the compose version.
fn parse_ps_output(output: &str) -> Result<Vec<ComposeService>> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut services = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        services.push(serde_json::from_str(line)?);
    }
    Ok(services)
}

/// Stack Deployer: pull then start. Either failure is fatal.
pub async fn deploy_stack(compose: &Compose<'_>) -> Result<()> {
    compose.pull().await?;
    compose
        .up_detached()
        .await
        .map_err(|e| HostError::StackStartFailed(e.to_string()))?;
    Ok(())
}
