//! apt-get wrapper
//!
//! Wraps the package manager through its idempotent install verbs.
//! Installation failures are fatal to the provisioning run.

use crate::error::{HostError, Result};
use crate::runner::CommandRunner;

/// apt-get wrapper
pub struct Apt<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Apt<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Refresh the package index
    pub async fn update(&self) -> Result<()> {
        self.runner
            .run_checked("apt-get", &["update", "-y"])
            .await
            .map_err(|e| HostError::InstallFailed(e.to_string()))?;
        Ok(())
    }

    /// Install packages (no-op for packages already present)
    pub async fn install(&self, packages: &[&str]) -> Result<()> {
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(packages);

        self.runner
            .run_checked("apt-get", &args)
            .await
            .map_err(|e| HostError::InstallFailed(e.to_string()))?;
        Ok(())
    }

    /// Check whether a package is installed
    pub async fn is_installed(&self, package: &str) -> Result<bool> {
        Ok(self.runner.run("dpkg", &["-s", package]).await?.success)
    }
}
