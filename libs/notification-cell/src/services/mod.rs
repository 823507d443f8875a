pub mod sender;
pub mod templates;
pub mod whatsapp;

pub use sender::{deliver, dispatch, notifier_from_config, LogNotifier, NotificationSender};
pub use whatsapp::WhatsAppNotifier;
