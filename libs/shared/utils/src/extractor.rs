use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Query, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
    Json,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde::de::DeserializeOwned;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Validates the bearer token, requires the admin role (401/403) and stores the `User`
/// in request extensions.
pub async fn admin_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&config, &request)?;
    require_admin(&user)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".to_string()))
    }
}

/// JSON body extractor whose rejections are reported as validation errors (400)
/// instead of axum's default 415/422 plain-text responses.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query-string extractor with the same 400 JSON rejection as `ValidatedJson`.
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn authenticate(config: &AppConfig, request: &Request<Body>) -> Result<User, AppError> {
    let auth = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Missing or malformed bearer token".to_string()))?;

    validate_token(auth.token(), &config.supabase_jwt_secret).map_err(AppError::Auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::test_utils::TestUser;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&TestUser::admin("a@example.com").to_user()).is_ok());
        assert_matches!(
            require_admin(&TestUser::client("c@example.com").to_user()),
            Err(AppError::Forbidden(_))
        );
    }
}
