//! ufw wrapper (best-effort firewall adjustment)
//!
//! The rule is added only when the firewall is already active; a dormant
//! firewall is never enabled, and a failed rule-add never fails the run.

use crate::error::Result;
use crate::runner::CommandRunner;
use tracing::warn;

/// Allow rule covering the proxy's standard web ports (80/443)
pub const PROXY_RULE: &str = "Nginx Full";

/// ufw wrapper
pub struct Ufw<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Ufw<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub async fn is_present(&self) -> Result<bool> {
        self.runner.is_on_path("ufw").await
    }

    /// Check the firewall state without changing it
    pub async fn is_active(&self) -> Result<bool> {
        let output = self.runner.run("ufw", &["status"]).await?;
        Ok(output.success && output.stdout.contains("Status: active"))
    }

    pub async fn allow(&self, rule: &str) -> Result<()> {
        self.runner.run_checked("ufw", &["allow", rule]).await?;
        Ok(())
    }
}

/// Outcome of the firewall adjustment step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirewallOutcome {
    /// Rule added (or already present; ufw's allow verb is idempotent)
    RuleAdded,
    /// ufw not installed
    NotPresent,
    /// Firewall dormant, left untouched
    Inactive,
    /// Rule-add failed; provisioning continues
    Failed(String),
}

/// Firewall Adjuster: open the proxy ports only on an active firewall.
/// Never returns an error.
pub async fn adjust_firewall(runner: &dyn CommandRunner) -> FirewallOutcome {
    let ufw = Ufw::new(runner);

    match ufw.is_present().await {
        Ok(true) => {}
        Ok(false) => return FirewallOutcome::NotPresent,
        Err(e) => return FirewallOutcome::Failed(e.to_string()),
    }

    match ufw.is_active().await {
        Ok(true) => {}
        Ok(false) => return FirewallOutcome::Inactive,
        Err(e) => return FirewallOutcome::Failed(e.to_string()),
    }

    match ufw.allow(PROXY_RULE).await {
        Ok(()) => FirewallOutcome::RuleAdded,
        Err(e) => {
            warn!(rule = PROXY_RULE, error = %e, "firewall rule add failed");
            FirewallOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::MockRunner;
    use crate::runner::CommandOutput;

    #[tokio::test]
    async fn test_inactive_firewall_untouched() {
        let runner = MockRunner::new().respond(
            "ufw status",
            CommandOutput::ok("Status: inactive\n"),
        );

        let outcome = adjust_firewall(&runner).await;
        assert_eq!(outcome, FirewallOutcome::Inactive);
        // allow は一度も呼ばれない
        assert!(!runner.invoked("ufw allow"));
        // enable も決して呼ばれない
        assert!(!runner.invoked("ufw enable"));
    }

    #[tokio::test]
    async fn test_active_firewall_gets_rule() {
        let runner = MockRunner::new().respond(
            "ufw status",
            CommandOutput::ok("Status: active\n\nTo    Action    From\n"),
        );

        let outcome = adjust_firewall(&runner).await;
        assert_eq!(outcome, FirewallOutcome::RuleAdded);
        assert!(runner.invoked("ufw allow Nginx Full"));
    }

    #[tokio::test]
    async fn test_missing_ufw_is_noop() {
        let runner = MockRunner::new().fail_on("which ufw", "");
        let outcome = adjust_firewall(&runner).await;
        assert_eq!(outcome, FirewallOutcome::NotPresent);
    }

    #[tokio::test]
    async fn test_rule_failure_does_not_propagate() {
        let runner = MockRunner::new()
            .respond("ufw status", CommandOutput::ok("Status: active\n"))
            .fail_on("ufw allow", "could not insert rule");

        let outcome = adjust_firewall(&runner).await;
        assert!(matches!(outcome, FirewallOutcome::Failed(_)));
    }
}
