//! Host preparation
//!
//! Converges the host onto the required system packages and services:
//! base utilities, container runtime + compose plugin, reverse proxy,
//! and (when TLS stays enabled) the certificate client. Every operation
//! detects prior installation and is safe to repeat; failures here are
//! fatal to the run.

use crate::compose::Docker;
use crate::error::Result;
use crate::pkg::Apt;
use crate::runner::CommandRunner;
use crate::systemd::Systemctl;

/// Base utilities expected by the rest of the workflow
pub const BASE_PACKAGES: &[&str] = &["ca-certificates", "curl", "gnupg"];
/// Certificate client and its nginx integration plugin
pub const CERTBOT_PACKAGES: &[&str] = &["certbot", "python3-certbot-nginx"];

/// Whether an ensure-step had to install anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensure {
    Installed,
    AlreadyPresent,
}

/// Host Preparer
pub struct Preparer<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Preparer<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Refresh the package index and install base utilities
    pub async fn prepare_packages(&self) -> Result<()> {
        let apt = Apt::new(self.runner);
        apt.update().await?;
        apt.install(BASE_PACKAGES).await?;
        Ok(())
    }

    /// Ensure the container runtime + compose plugin are installed and
    /// the runtime service is enabled and running.
    pub async fn ensure_docker(&self) -> Result<Ensure> {
        let docker = Docker::new(self.runner);
        let present = docker.is_installed().await?;
        if !present {
            docker.install().await?;
        }
        // enable + start は繰り返しても安全
        Systemctl::new(self.runner).enable_now("docker").await?;
        Ok(if present {
            Ensure::AlreadyPresent
        } else {
            Ensure::Installed
        })
    }

    /// Ensure the reverse proxy is installed, enabled and running.
    pub async fn ensure_nginx(&self) -> Result<Ensure> {
        let apt = Apt::new(self.runner);
        let present = apt.is_installed("nginx").await?;
        if !present {
            apt.install(&["nginx"]).await?;
        }
        Systemctl::new(self.runner).enable_now("nginx").await?;
        Ok(if present {
            Ensure::AlreadyPresent
        } else {
            Ensure::Installed
        })
    }

    /// Install the certificate client and its proxy plugin
    pub async fn install_certbot(&self) -> Result<()> {
        Apt::new(self.runner).install(CERTBOT_PACKAGES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;

    #[tokio::test]
    async fn test_prepare_packages_updates_then_installs() {
        let runner = MockRunner::new();
        Preparer::new(&runner).prepare_packages().await.unwrap();

        let invocations = runner.invocations();
        let update_idx = invocations
            .iter()
            .position(|l| l.starts_with("apt-get update"))
            .unwrap();
        let install_idx = invocations
            .iter()
            .position(|l| l.starts_with("apt-get install"))
            .unwrap();
        assert!(update_idx < install_idx);
    }

    #[tokio::test]
    async fn test_docker_already_present_skips_install() {
        let runner = MockRunner::new();
        let outcome = Preparer::new(&runner).ensure_docker().await.unwrap();

        assert_eq!(outcome, Ensure::AlreadyPresent);
        assert!(!runner.invoked("sh -c curl"));
        // サービスの有効化は毎回行う
        assert!(runner.invoked("systemctl enable --now docker"));
    }

    #[tokio::test]
    async fn test_docker_missing_triggers_install() {
        let runner = MockRunner::new().fail_on("which docker", "");
        let outcome = Preparer::new(&runner).ensure_docker().await.unwrap();

        assert_eq!(outcome, Ensure::Installed);
        assert!(runner.invoked("sh -c curl -fsSL https://get.docker.com"));
    }

    #[tokio::test]
    async fn test_nginx_missing_triggers_install() {
        let runner = MockRunner::new().fail_on("dpkg -s nginx", "");
        let outcome = Preparer::new(&runner).ensure_nginx().await.unwrap();

        assert_eq!(outcome, Ensure::Installed);
        assert!(runner.invoked("apt-get install -y nginx"));
        assert!(runner.invoked("systemctl enable --now nginx"));
    }

    #[tokio::test]
    async fn test_install_failure_propagates() {
        let runner = MockRunner::new().fail_on("apt-get update", "mirror unreachable");
        assert!(Preparer::new(&runner).prepare_packages().await.is_err());
    }

    #[tokio::test]
    async fn test_install_certbot() {
        let runner = MockRunner::new();
        Preparer::new(&runner).install_certbot().await.unwrap();
        assert!(runner.invoked("apt-get install -y certbot python3-certbot-nginx"));
    }
}
