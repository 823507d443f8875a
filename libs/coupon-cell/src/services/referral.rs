use std::sync::Arc;

use rand::Rng;
use serde_json::json;
use tracing::info;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::validation::is_valid_phone;
use uuid::Uuid;

use crate::error::CouponError;
use crate::models::{CreateReferralRequest, Referral, ReferralStatus};

const REFERRAL_PREFIX: &str = "IND";
const REFERRAL_CODE_LEN: usize = 8;
const REFERRAL_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub struct ReferralService {
    supabase: Arc<SupabaseClient>,
}

impl ReferralService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn create_referral(
        &self,
        client_id: Uuid,
        request: CreateReferralRequest,
    ) -> Result<Referral, CouponError> {
        let referred_name = request.referred_name.trim();
        if referred_name.is_empty() {
            return Err(CouponError::ValidationError("Referred name is required".to_string()));
        }
        if !is_valid_phone(&request.referred_phone) {
            return Err(CouponError::ValidationError("Referred phone is invalid".to_string()));
        }

        let row = json!({
            "client_id": client_id,
            "referred_name": referred_name,
            "referred_phone": request.referred_phone.trim(),
            "code": generate_referral_code(),
            "status": ReferralStatus::Pending,
        });

        let referral: Referral = self.supabase.insert("referrals", &row).await?;
        info!("Client {} referred {} with code {}", client_id, referral.referred_name, referral.code);

        Ok(referral)
    }

    /// All referrals, newest first.
    pub async fn list_referrals(&self) -> Result<Vec<Referral>, CouponError> {
        let referrals = self
            .supabase
            .select("/rest/v1/referrals?order=created_at.desc")
            .await?;
        Ok(referrals)
    }
}

pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REFERRAL_CODE_LEN)
        .map(|_| REFERRAL_CHARSET[rng.gen_range(0..REFERRAL_CHARSET.len())] as char)
        .collect();

    format!("{}{}", REFERRAL_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_shape() {
        for _ in 0..50 {
            let code = generate_referral_code();
            assert_eq!(code.len(), 11);
            assert!(code.starts_with("IND"));
            assert!(code[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}
