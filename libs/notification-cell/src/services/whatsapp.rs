use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{NotificationError, WhatsAppTextMessage};
use crate::services::sender::NotificationSender;

pub struct WhatsAppNotifier {
    client: Client,
    base_url: String,
    api_token: String,
    phone_number_id: String,
}

impl WhatsAppNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.whatsapp_api_url.trim_end_matches('/').to_string(),
            api_token: config.whatsapp_api_token.clone(),
            phone_number_id: config.whatsapp_phone_number_id.clone(),
        }
    }
}

#[async_trait]
impl NotificationSender for WhatsAppNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), NotificationError> {
        let to = normalize_phone(recipient)?;
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        debug!("Sending WhatsApp message to {}", to);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&WhatsAppTextMessage::new(to, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "whatsapp"
    }
}

/// Reduce a free-form phone number to the digits-only international form WhatsApp expects.
/// Brazilian local numbers (10 or 11 digits) get the 55 country code.
pub fn normalize_phone(raw: &str) -> Result<String, NotificationError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 | 11 => Ok(format!("55{}", digits)),
        12..=15 => Ok(digits),
        _ => Err(NotificationError::InvalidRecipient(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("(11) 98765-4321").unwrap(), "5511987654321");
        assert_eq!(normalize_phone("+55 11 98765-4321").unwrap(), "5511987654321");
        assert_matches!(normalize_phone("12345"), Err(NotificationError::InvalidRecipient(_)));
    }
}
