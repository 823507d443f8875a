use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::AppError;

/// Postgres SQLSTATE for unique_violation, surfaced by PostgREST in the `code` field.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Constraint conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    Header(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Conflict(msg) => AppError::Conflict(msg),
            SupabaseError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    /// Headers asking PostgREST to echo written rows back.
    pub fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|e| SupabaseError::Header(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Server-side calls without a caller token act with the service role.
        let bearer = match auth_token {
            Some(token) => Some(token),
            None if !self.service_key.is_empty() => Some(self.service_key.as_str()),
            None if !self.anon_key.is_empty() => Some(self.anon_key.as_str()),
            None => None,
        };

        if let Some(token) = bearer {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SupabaseError::Header(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Supabase API error ({}): {}", status, error_text);
            return Err(classify_error(status, error_text));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(Value::Array(vec![]))?);
        }

        Ok(serde_json::from_slice::<T>(&bytes)?)
    }

    /// GET rows matching a PostgREST path (`/rest/v1/<table>?<filters>`).
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, SupabaseError>
    where T: DeserializeOwned {
        self.request(Method::GET, path, None, None).await
    }

    /// INSERT a single row and return the stored representation.
    pub async fn insert<T, B>(&self, table: &str, row: &B) -> Result<T, SupabaseError>
    where T: DeserializeOwned, B: Serialize {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &path,
            None,
            Some(serde_json::to_value(row)?),
            Some(Self::representation_headers()),
        ).await?;

        if rows.is_empty() {
            return Err(SupabaseError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!("insert into {} returned no rows", table),
            });
        }

        Ok(rows.swap_remove(0))
    }

    /// PATCH every row matched by `path`; an empty result means nothing matched.
    pub async fn update<T>(&self, path: &str, changes: Value) -> Result<Vec<T>, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::PATCH,
            path,
            None,
            Some(changes),
            Some(Self::representation_headers()),
        ).await
    }

    /// DELETE every row matched by `path`, returning the removed rows.
    pub async fn delete<T>(&self, path: &str) -> Result<Vec<T>, SupabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(
            Method::DELETE,
            path,
            None,
            None,
            Some(Self::representation_headers()),
        ).await
    }
}

fn classify_error(status: StatusCode, body: String) -> SupabaseError {
    let code = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));

    if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
        return SupabaseError::Conflict(body);
    }

    match status.as_u16() {
        401 | 403 => SupabaseError::Auth(body),
        404 => SupabaseError::NotFound(body),
        other => SupabaseError::Api { status: other, message: body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::{MockServer, Mock, ResponseTemplate};
    use wiremock::matchers::{method, path, header};

    fn test_config(url: String) -> AppConfig {
        AppConfig {
            supabase_url: url,
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: "service".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            whatsapp_api_url: String::new(),
            whatsapp_api_token: String::new(),
            whatsapp_phone_number_id: String::new(),
            admin_whatsapp_number: String::new(),
            server_port: 3000,
            daily_report_hour: 8,
        }
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let body = json!({"code": "23505", "message": "duplicate key"}).to_string();
        assert_matches!(classify_error(StatusCode::CONFLICT, body.clone()), SupabaseError::Conflict(_));
        assert_matches!(classify_error(StatusCode::BAD_REQUEST, body), SupabaseError::Conflict(_));
    }

    #[test]
    fn test_other_statuses_are_classified() {
        assert_matches!(classify_error(StatusCode::UNAUTHORIZED, String::new()), SupabaseError::Auth(_));
        assert_matches!(classify_error(StatusCode::NOT_FOUND, String::new()), SupabaseError::NotFound(_));
        assert_matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            SupabaseError::Api { status: 500, .. }
        );
    }

    #[tokio::test]
    async fn test_server_side_requests_use_service_role() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/coupons"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"code": "X"}])))
            .mount(&mock_server)
            .await;

        let client = SupabaseClient::new(&test_config(mock_server.uri()));
        let rows: Vec<Value> = client.select("/rest/v1/coupons").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_conflict_surfaces_as_conflict() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&mock_server)
            .await;

        let client = SupabaseClient::new(&test_config(mock_server.uri()));
        let result: Result<Value, _> = client.insert("appointments", &json!({"x": 1})).await;
        assert_matches!(result, Err(SupabaseError::Conflict(_)));
    }
}
