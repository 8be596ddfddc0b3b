// # Exec Notifier
//
// Notifier implementation that runs an external handler script with the
// fixed positional argument schema:
//
// - `<script> ifstate <ifname> int|ext`
// - `<script> bp add|remove local|remote <ipv6>`
// - `<script> rpa local|remote <new-ipv6> <previous-ipv6>`
//
// The handler is run to completion per invocation, one at a time from the
// engine's single thread of control. Its exit status is not inspected;
// failure to spawn is reported to the caller, which logs and moves on.

use async_trait::async_trait;
use mcoord_core::{Error, Notification, Notifier, Result};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Notifier that executes an external handler script
#[derive(Debug, Clone)]
pub struct ExecNotifier {
    script: PathBuf,
}

impl ExecNotifier {
    /// Create a notifier invoking the handler at `script`
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Path of the configured handler script
    pub fn script(&self) -> &PathBuf {
        &self.script
    }
}

#[async_trait]
impl Notifier for ExecNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let args = notification.to_args();
        debug!("running {} {}", self.script.display(), args.join(" "));

        let status = Command::new(&self.script)
            .args(&args)
            .status()
            .await
            .map_err(|e| Error::notifier(format!("failed to run {}: {}", self.script.display(), e)))?;

        // Fire-and-forget: the handler's exit status is not inspected
        debug!("handler exited with {}", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_existing_handler() {
        // `true` accepts and ignores any arguments
        let notifier = ExecNotifier::new("/bin/true");
        let n = Notification::IfaceState {
            ifname: "eth0".to_string(),
            internal: false,
        };
        assert!(notifier.notify(&n).await.is_ok());
    }

    #[tokio::test]
    async fn nonzero_exit_status_is_not_an_error() {
        let notifier = ExecNotifier::new("/bin/false");
        let n = Notification::BorderProxy {
            added: true,
            local: true,
            address: "2001:db8::1".parse().unwrap(),
        };
        assert!(notifier.notify(&n).await.is_ok());
    }

    #[tokio::test]
    async fn missing_handler_reports_notifier_error() {
        let notifier = ExecNotifier::new("/nonexistent/mcoord-handler");
        let n = Notification::RendezvousPoint {
            local: true,
            address: "2001:db8::1".parse().unwrap(),
            previous: "::".parse().unwrap(),
        };
        let err = notifier.notify(&n).await.unwrap_err();
        assert!(matches!(err, Error::Notifier(_)));
    }
}
