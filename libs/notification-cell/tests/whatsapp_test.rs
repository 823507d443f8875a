use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, body_partial_json};

use notification_cell::{deliver, notifier_from_config, NotificationError, NotificationSender, WhatsAppNotifier};
use shared_utils::test_utils::TestConfig;

#[tokio::test]
async fn test_whatsapp_text_message_is_posted() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_whatsapp_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/1234567890/messages"))
        .and(header("authorization", "Bearer test-whatsapp-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "5511987654321",
            "type": "text",
            "text": { "body": "Olá" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "id": "wamid.test" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let notifier = WhatsAppNotifier::new(&config);
    notifier.send("(11) 98765-4321", "Olá").await.unwrap();
}

#[tokio::test]
async fn test_provider_rejection_is_reported_not_panicked() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::default().with_whatsapp_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&mock_server)
        .await;

    let notifier = WhatsAppNotifier::new(&config);
    let result = notifier.send("5511987654321", "hello").await;
    assert_matches!(result, Err(NotificationError::Rejected { status: 401, .. }));

    // The swallowing wrapper turns the failure into `false`.
    assert!(!deliver(&notifier, "5511987654321", "hello").await);
}

#[tokio::test]
async fn test_unconfigured_provider_falls_back_to_logging() {
    let config = TestConfig::default().to_app_config();
    let notifier: Arc<dyn NotificationSender> = notifier_from_config(&config);

    assert_eq!(notifier.provider_name(), "log");
    assert!(deliver(notifier.as_ref(), "5511987654321", "hello").await);
}
