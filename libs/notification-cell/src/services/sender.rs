use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::NotificationError;
use crate::services::whatsapp::WhatsAppNotifier;

/// Outbound messaging boundary used by the booking flows.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError>;

    fn provider_name(&self) -> &'static str;
}

/// Used when no messaging provider is configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        info!("Notification for {} (not delivered, provider disabled): {}", recipient, message);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}

pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn NotificationSender> {
    if config.is_whatsapp_configured() {
        Arc::new(WhatsAppNotifier::new(config))
    } else {
        Arc::new(LogNotifier)
    }
}

/// Fire-and-forget delivery. Failures are logged and never reach the caller.
pub fn dispatch(sender: Arc<dyn NotificationSender>, recipient: String, message: String) {
    if recipient.trim().is_empty() {
        warn!("Skipping notification with empty recipient");
        return;
    }

    tokio::spawn(async move {
        deliver(sender.as_ref(), &recipient, &message).await;
    });
}

/// Awaitable form of `dispatch`; returns whether the provider accepted the message.
pub async fn deliver(sender: &dyn NotificationSender, recipient: &str, message: &str) -> bool {
    match sender.send(recipient, message).await {
        Ok(()) => {
            info!("Notification sent to {} via {}", recipient, sender.provider_name());
            true
        }
        Err(e) => {
            warn!("Notification to {} via {} failed: {}", recipient, sender.provider_name(), e);
            false
        }
    }
}
