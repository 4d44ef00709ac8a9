//! systemctl wrapper and boot-unit registration

use crate::error::Result;
use crate::paths::{HostPaths, UNIT_NAME};
use crate::runner::CommandRunner;
use flowhaven_core::assets::BOOT_UNIT_TEMPLATE;
use flowhaven_core::template::render_boot_unit;
use tracing::warn;

/// systemctl wrapper
pub struct Systemctl<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Systemctl<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn daemon_reload(&self) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["daemon-reload"])
            .await?;
        Ok(())
    }

    pub async fn enable(&self, unit: &str) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["enable", unit])
            .await?;
        Ok(())
    }

    /// Enable and start in one step (safe to repeat)
    pub async fn enable_now(&self, unit: &str) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["enable", "--now", unit])
            .await?;
        Ok(())
    }

    pub async fn start(&self, unit: &str) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["start", unit])
            .await?;
        Ok(())
    }

    pub async fn reload(&self, unit: &str) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["reload", unit])
            .await?;
        Ok(())
    }

    pub async fn is_enabled(&self, unit: &str) -> Result<bool> {
        Ok(self
            .runner
            .run("systemctl", &["is-enabled", unit])
            .await?
            .success)
    }
}

/// Result of boot-unit registration
#[derive(Debug, Clone)]
pub struct BootUnitReport {
    /// Whether the immediate start succeeded
    pub started: bool,
    pub start_error: Option<String>,
}

/// Persistence Registrar: write the unit, reload the unit database,
/// enable for future boots and attempt an immediate start.
///
/// The immediate start is allowed to fail (the Stack Deployer already
/// started the stack once); enablement is not.
pub async fn register_boot_unit(
    runner: &dyn CommandRunner,
    paths: &HostPaths,
) -> Result<BootUnitReport> {
    let unit = render_boot_unit(BOOT_UNIT_TEMPLATE, &paths.deploy_dir);
    std::fs::create_dir_all(&paths.systemd_dir)?;
    std::fs::write(paths.unit_file(), unit)?;

    let systemctl = Systemctl::new(runner);
    systemctl.daemon_reload().await?;
    systemctl.enable(UNIT_NAME).await?;

    match systemctl.start(UNIT_NAME).await {
        Ok(()) => Ok(BootUnitReport {
            started: true,
            start_error: None,
        }),
        Err(e) => {
            warn!(unit = UNIT_NAME, error = %e, "boot unit start failed, stack already running");
            Ok(BootUnitReport {
                started: false,
                start_error: Some(e.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;

    #[tokio::test]
    async fn test_register_writes_unit_and_enables() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::under_root(dir.path());
        let runner = MockRunner::new();

        let report = register_boot_unit(&runner, &paths).await.unwrap();
        assert!(report.started);

        let unit = std::fs::read_to_string(paths.unit_file()).unwrap();
        assert!(unit.contains("RemainAfterExit=yes"));
        assert!(unit.contains("TimeoutStartSec=0"));
        assert!(unit.contains(&format!(
            "WorkingDirectory={}",
            paths.deploy_dir.display()
        )));

        assert!(runner.invoked("systemctl daemon-reload"));
        assert!(runner.invoked("systemctl enable n8n.service"));
        assert!(runner.invoked("systemctl start n8n.service"));
    }

    #[tokio::test]
    async fn test_immediate_start_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::under_root(dir.path());
        let runner = MockRunner::new().fail_on("systemctl start", "start job timed out");

        let report = register_boot_unit(&runner, &paths).await.unwrap();
        assert!(!report.started);
        assert!(report.start_error.is_some());
        // enable までは完了している
        assert!(runner.invoked("systemctl enable n8n.service"));
    }

    #[tokio::test]
    async fn test_enable_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths::under_root(dir.path());
        let runner = MockRunner::new().fail_on("systemctl enable n8n.service", "no such unit");

        assert!(register_boot_unit(&runner, &paths).await.is_err());
    }
}
