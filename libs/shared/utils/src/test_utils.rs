use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub whatsapp_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            whatsapp_api_url: String::new(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    /// Point the WhatsApp adapter at a mock server as well.
    pub fn with_whatsapp_url(mut self, url: impl Into<String>) -> Self {
        self.whatsapp_api_url = url.into();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        let whatsapp_enabled = !self.whatsapp_api_url.is_empty();
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            whatsapp_api_url: self.whatsapp_api_url.clone(),
            whatsapp_api_token: if whatsapp_enabled { "test-whatsapp-token".to_string() } else { String::new() },
            whatsapp_phone_number_id: if whatsapp_enabled { "1234567890".to_string() } else { String::new() },
            admin_whatsapp_number: "5511900000000".to_string(),
            server_port: 3000,
            daily_report_hour: 8,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "client")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "client")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn admin_bearer(config: &AppConfig) -> String {
        let admin = TestUser::admin("admin@example.com");
        format!("Bearer {}", Self::create_test_token(&admin, &config.supabase_jwt_secret, Some(1)))
    }

    pub fn client_bearer(config: &AppConfig) -> String {
        let client = TestUser::client("client@example.com");
        format!("Bearer {}", Self::create_test_token(&client, &config.supabase_jwt_secret, Some(1)))
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// PostgREST-shaped rows for the tables the booking cells read.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn consultation_type_response(id: &str, name: &str, price: f64, active: bool) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "description": format!("{} session", name),
            "price": price,
            "duration_minutes": 60,
            "theme_color": "#7c3aed",
            "sort_order": 1,
            "active": active,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn template_response(day_of_week: u8, start: &str, end: &str, interval_minutes: i32) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end,
            "interval_minutes": interval_minutes,
            "active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(id: &str, consultation_type_id: &str, scheduled_at: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "client_name": "Maria Silva",
            "client_phone": "5511987654321",
            "client_email": "maria@example.com",
            "consultation_type_id": consultation_type_id,
            "scheduled_at": scheduled_at,
            "notes": null,
            "status": status,
            "original_price": 80.0,
            "discount_amount": 0.0,
            "amount_charged": 80.0,
            "coupon_code": null,
            "meeting_link": null,
            "admin_note": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn coupon_response(code: &str, kind: &str, value: f64, minimum: Option<f64>,
                           usage_cap: Option<i32>, usage_count: i32) -> serde_json::Value {
        let now = Utc::now();
        json!({
            "id": Uuid::new_v4(),
            "code": code,
            "description": format!("{} promotion", code),
            "discount_kind": kind,
            "discount_value": value,
            "minimum_order_value": minimum,
            "valid_from": (now - Duration::days(1)).to_rfc3339(),
            "valid_until": (now + Duration::days(30)).to_rfc3339(),
            "usage_cap": usage_cap,
            "usage_count": usage_count,
            "active": true,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.supabase_url, "http://localhost:54321");
        assert!(!config.supabase_jwt_secret.is_empty());
        assert!(!config.is_whatsapp_configured());
    }

    #[test]
    fn test_whatsapp_mock_enables_adapter() {
        let config = TestConfig::default().with_whatsapp_url("http://127.0.0.1:9").to_app_config();
        assert!(config.is_whatsapp_configured());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
