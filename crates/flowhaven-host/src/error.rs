//! Host collaborator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Package installation failed: {0}")]
    InstallFailed(String),

    #[error("Container runtime installation failed: {0}")]
    RuntimeInstallFailed(String),

    #[error("Proxy configuration validation failed:\n{0}")]
    ProxyValidationFailed(String),

    #[error("Stack start failed: {0}")]
    StackStartFailed(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] flowhaven_core::CoreError),
}

pub type Result<T> = std::result::Result<T, HostError>;
