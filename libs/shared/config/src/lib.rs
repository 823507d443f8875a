use std::env;
use tracing::warn;

pub const DEFAULT_WHATSAPP_API_URL: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
    pub whatsapp_phone_number_id: String,
    pub admin_whatsapp_number: String,
    pub server_port: u16,
    pub daily_report_hour: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, writes will use the anon key");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| DEFAULT_WHATSAPP_API_URL.to_string()),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_API_TOKEN not set, notifications will only be logged");
                    String::new()
                }),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .unwrap_or_else(|_| {
                    warn!("WHATSAPP_PHONE_NUMBER_ID not set, using empty value");
                    String::new()
                }),
            admin_whatsapp_number: env::var("ADMIN_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| {
                    warn!("ADMIN_WHATSAPP_NUMBER not set, admin notifications disabled");
                    String::new()
                }),
            server_port: parse_or_default("SERVER_PORT", 3000),
            daily_report_hour: parse_or_default::<u32>("DAILY_REPORT_HOUR", 8).min(23),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_whatsapp_configured(&self) -> bool {
        !self.whatsapp_api_url.is_empty()
            && !self.whatsapp_api_token.is_empty()
            && !self.whatsapp_phone_number_id.is_empty()
    }

    pub fn has_admin_recipient(&self) -> bool {
        !self.admin_whatsapp_number.is_empty()
    }
}

fn parse_or_default<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
