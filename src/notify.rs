use async_trait::async_trait;
use tracing::{debug, info};

/// Delivers password-reset tokens out of band (email, SMS, carrier pigeon).
///
/// Delivery failures do not abort the reset flow; the token stays valid and
/// the handler reports the failure through its own logging.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn deliver_reset_token(&self, email: &str, token: &str) -> anyhow::Result<()>;
}

/// Log-only delivery, used until a real mailer is wired up and in tests.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn deliver_reset_token(&self, email: &str, token: &str) -> anyhow::Result<()> {
        info!(email = %email, "password reset token ready for delivery");
        debug!(token = %token, "reset token (log-only delivery)");
        Ok(())
    }
}
