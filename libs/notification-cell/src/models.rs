use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Messaging provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Messaging provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// WhatsApp Cloud API text message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppTextMessage {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: WhatsAppText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppText {
    pub preview_url: bool,
    pub body: String,
}

impl WhatsAppTextMessage {
    pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to: to.into(),
            message_type: "text".to_string(),
            text: WhatsAppText {
                preview_url: true,
                body: body.into(),
            },
        }
    }
}

/// Booking details a message template needs; decoupled from the booking cell's types.
#[derive(Debug, Clone)]
pub struct BookingNotice {
    pub client_name: String,
    pub client_phone: String,
    pub consultation_name: String,
    pub scheduled_at: chrono::NaiveDateTime,
    pub amount_charged: f64,
    pub meeting_link: Option<String>,
}
