//! Command runner abstraction
//!
//! Every external tool (apt-get, docker, nginx, certbot, systemctl, ufw)
//! is invoked through this trait so collaborators can be exercised in
//! tests with a scripted runner instead of the real host.

use crate::error::{HostError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Abstraction over external command execution
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command and capture its output. Only spawn failures are
    /// errors; a non-zero exit is reported through `CommandOutput`.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command, treating a non-zero exit as an error. Returns stdout.
    async fn run_checked(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = self.run(program, args).await?;
        if !output.success {
            return Err(HostError::CommandFailed {
                command: format_command(program, args),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    /// Check whether a program exists on PATH.
    async fn is_on_path(&self, program: &str) -> Result<bool> {
        Ok(self.run("which", &[program]).await?.success)
    }

    /// Run a shell snippet (used for vendor install pipelines).
    async fn run_shell(&self, script: &str) -> Result<CommandOutput> {
        self.run("sh", &["-c", script]).await
    }
}

/// Render a command line for diagnostics
pub fn format_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Runner backed by real process execution
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {}", format_command(program, args));

        let output = cmd.output().await?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted runner for collaborator tests

    use super::*;
    use std::sync::Mutex;

    /// Records every invocation and answers from scripted rules.
    /// Unmatched commands succeed with empty output.
    pub struct MockRunner {
        rules: Vec<(String, CommandOutput)>,
        invocations: Mutex<Vec<String>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            Self {
                rules: Vec::new(),
                invocations: Mutex::new(Vec::new()),
            }
        }

        /// Respond to command lines starting with `prefix`
        pub fn respond(mut self, prefix: &str, output: CommandOutput) -> Self {
            self.rules.push((prefix.to_string(), output));
            self
        }

        pub fn fail_on(self, prefix: &str, stderr: &str) -> Self {
            self.respond(prefix, CommandOutput::failed(stderr))
        }

        pub fn invocations(&self) -> Vec<String> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn invoked(&self, prefix: &str) -> bool {
            self.invocations()
                .iter()
                .any(|line| line.starts_with(prefix))
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            let line = format_command(program, args);
            self.invocations.lock().unwrap().push(line.clone());

            for (prefix, output) in &self.rules {
                if line.starts_with(prefix.as_str()) {
                    return Ok(output.clone());
                }
            }
            Ok(CommandOutput::ok(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockRunner;
    use super::*;

    #[tokio::test]
    async fn test_run_checked_surfaces_stderr() {
        let runner = MockRunner::new().fail_on("apt-get install", "no candidate");

        let err = runner
            .run_checked("apt-get", &["install", "-y", "nginx"])
            .await
            .unwrap_err();

        match err {
            HostError::CommandFailed { command, stderr } => {
                assert_eq!(command, "apt-get install -y nginx");
                assert_eq!(stderr, "no candidate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_is_on_path() {
        let runner = MockRunner::new().fail_on("which docker", "");
        assert!(!runner.is_on_path("docker").await.unwrap());
        assert!(runner.is_on_path("nginx").await.unwrap());
    }

    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let runner = SystemRunner;
        let output = runner.run("echo", &["hello"]).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_system_runner_nonzero_exit() {
        let runner = SystemRunner;
        let output = runner.run_shell("exit 3").await.unwrap();
        assert!(!output.success);
    }
}
