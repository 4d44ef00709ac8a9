//! Host filesystem locations
//!
//! All mutation targets are resolved through one struct so tests can
//! redirect the whole layout under a temporary root.

use std::path::{Path, PathBuf};

/// Site name under sites-available / sites-enabled
pub const SITE_NAME: &str = "n8n";
/// Boot unit file name
pub const UNIT_NAME: &str = "n8n.service";
/// Compose definition file name inside the deployment directory
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
/// Merged environment file name inside the deployment directory
pub const ENV_FILE_NAME: &str = ".env";

#[derive(Debug, Clone)]
pub struct HostPaths {
    /// Deployment directory holding compose definition, env and data volumes
    pub deploy_dir: PathBuf,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
    pub systemd_dir: PathBuf,
}

impl HostPaths {
    /// Real locations on the target host
    pub fn system() -> Self {
        Self {
            deploy_dir: PathBuf::from("/opt/n8n"),
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            systemd_dir: PathBuf::from("/etc/systemd/system"),
        }
    }

    /// Same layout relocated under `root` (for tests)
    pub fn under_root(root: &Path) -> Self {
        Self {
            deploy_dir: root.join("opt/n8n"),
            sites_available: root.join("etc/nginx/sites-available"),
            sites_enabled: root.join("etc/nginx/sites-enabled"),
            systemd_dir: root.join("etc/systemd/system"),
        }
    }

    pub fn compose_file(&self) -> PathBuf {
        self.deploy_dir.join(COMPOSE_FILE_NAME)
    }

    pub fn env_file(&self) -> PathBuf {
        self.deploy_dir.join(ENV_FILE_NAME)
    }

    pub fn site_available(&self) -> PathBuf {
        self.sites_available.join(SITE_NAME)
    }

    pub fn site_enabled(&self) -> PathBuf {
        self.sites_enabled.join(SITE_NAME)
    }

    pub fn default_site_enabled(&self) -> PathBuf {
        self.sites_enabled.join("default")
    }

    pub fn unit_file(&self) -> PathBuf {
        self.systemd_dir.join(UNIT_NAME)
    }

    /// Data volume directories for the deployment profile
    pub fn data_dirs(&self, queue_mode: bool) -> Vec<PathBuf> {
        let mut dirs = vec![self.deploy_dir.join("n8n_data")];
        if queue_mode {
            dirs.push(self.deploy_dir.join("redis_data"));
        }
        dirs
    }
}
