//! nginx controller
//!
//! Renders and activates the site configuration, then validates with
//! `nginx -t` before reloading. A configuration that fails validation is
//! never reloaded into production; that failure aborts the run.

use crate::error::{HostError, Result};
use crate::paths::HostPaths;
use crate::runner::CommandRunner;
use flowhaven_core::assets::NGINX_SITE_TEMPLATE;
use flowhaven_core::config::ProvisionConfig;
use flowhaven_core::template::render_site;
use std::path::Path;

/// nginx controller
pub struct Nginx<'a> {
    runner: &'a dyn CommandRunner,
    paths: &'a HostPaths,
}

impl<'a> Nginx<'a> {
    pub fn new(runner: &'a dyn CommandRunner, paths: &'a HostPaths) -> Self {
        Self { runner, paths }
    }

    /// Write the rendered site configuration to sites-available
    pub fn write_site(&self, rendered: &str) -> Result<()> {
        std::fs::create_dir_all(&self.paths.sites_available)?;
        std::fs::write(self.paths.site_available(), rendered)?;
        Ok(())
    }

    /// Create or refresh the activation symlink in sites-enabled
    pub fn activate_site(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.sites_enabled)?;
        let link = self.paths.site_enabled();
        remove_if_present(&link)?;
        std::os::unix::fs::symlink(self.paths.site_available(), &link)?;
        Ok(())
    }

    /// Remove the distribution's default site link to avoid a competing
    /// catch-all route. Returns true if something was removed.
    pub fn remove_default_site(&self) -> Result<bool> {
        remove_if_present(&self.paths.default_site_enabled())
    }

    /// Validate configuration syntax (`nginx -t`)
    pub async fn validate(&self) -> Result<()> {
        let output = self.runner.run("nginx", &["-t"]).await?;
        if !output.success {
            return Err(HostError::ProxyValidationFailed(output.stderr));
        }
        Ok(())
    }

    /// Reload the proxy service
    pub async fn reload(&self) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["reload", "nginx"])
            .await?;
        Ok(())
    }
}

/// Remove a file or symlink if it exists (dangling links included)
fn remove_if_present(path: &Path) -> Result<bool> {
    if std::fs::symlink_metadata(path).is_ok() {
        std::fs::remove_file(path)?;
        return Ok(true);
    }
    Ok(false)
}

/// What the proxy configuration pass did
#[derive(Debug, Clone)]
pub struct ProxyReport {
    /// server_name actually rendered
    pub server_name: String,
    /// Whether a default site link was removed this run
    pub removed_default_site: bool,
}

/// Proxy Configurator: render, activate, validate, reload.
pub async fn configure_proxy(
    runner: &dyn CommandRunner,
    paths: &HostPaths,
    config: &ProvisionConfig,
) -> Result<ProxyReport> {
    let rendered = render_site(NGINX_SITE_TEMPLATE, config.domain.as_deref(), config.port)?;

    let nginx = Nginx::new(runner, paths);
    nginx.write_site(&rendered)?;
    nginx.activate_site()?;
    let removed_default_site = nginx.remove_default_site()?;

    // 構文検証に失敗した設定は決してリロードしない
    nginx.validate().await?;
    nginx.reload().await?;

    Ok(ProxyReport {
        server_name: config
            .domain
            .clone()
            .unwrap_or_else(|| flowhaven_core::template::CATCH_ALL_SERVER_NAME.to_string()),
        removed_default_site,
    })
}
