//! certbot wrapper (non-interactive issuance)
//!
//! Issuance is best-effort: a failure here leaves the site serving plain
//! HTTP and must never abort the provisioning run. The caller decides
//! how to report it.

use crate::error::Result;
use crate::runner::CommandRunner;

/// certbot CLI wrapper
pub struct Certbot<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Certbot<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Obtain a certificate through the nginx plugin and rewrite the
    /// site to redirect to HTTPS.
    pub async fn issue_nginx(&self, domain: &str, email: &str) -> Result<()> {
        self.runner
            .run_checked(
                "certbot",
                &[
                    "--nginx",
                    "-d",
                    domain,
                    "-m",
                    email,
                    "--agree-tos",
                    "--non-interactive",
                    "--redirect",
                ],
            )
            .await?;
        Ok(())
    }
}
