//! Vendor activity-export client.
//!
//! Minimal client for the vendor's athlete API: refreshing an OAuth access
//! token, listing recent activities, and fetching the raw TCX export for a
//! single activity id. The enhancement pipeline consumes the returned TCX
//! text; nothing here interprets it.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://www.strava.com";

/// Error type for vendor API failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vendor API returned status {0}")]
    Status(reqwest::StatusCode),
}

/// One activity as listed by the vendor API.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: String,
}

/// Response of the OAuth token refresh endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

/// Refreshes an access token using the stored refresh token.
pub async fn refresh_access_token(
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse, ClientError> {
    let http = reqwest::Client::new();
    let response = http
        .post(format!("{base_url}/oauth/token"))
        .json(&json!({
            "client_id": client_id,
            "client_secret": client_secret,
            "refresh_token": refresh_token,
            "grant_type": "refresh_token",
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientError::Status(response.status()));
    }
    Ok(response.json().await?)
}

/// Authenticated client for listing and exporting activities.
pub struct ExportClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ExportClient {
    /// Creates a client against the production vendor API.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, access_token)
    }

    /// Creates a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Lists one page of the athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ActivitySummary>, ClientError> {
        debug!(page, per_page, "listing activities");
        let response = self
            .http
            .get(format!("{}/api/v3/athlete/activities", self.base_url))
            .query(&[("page", page), ("per_page", per_page)])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Fetches the raw TCX export for one activity.
    pub async fn fetch_tcx(&self, activity_id: u64) -> Result<String, ClientError> {
        debug!(activity_id, "fetching TCX export");
        let response = self
            .http
            .get(format!(
                "{}/api/v3/activities/{activity_id}/export_tcx",
                self.base_url
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_summary_deserializes() {
        let payload = r#"{
            "id": 987654321,
            "name": "Morning Run",
            "type": "Run",
            "start_date": "2023-04-01T09:00:00Z",
            "distance": 9656.1
        }"#;

        let summary: ActivitySummary = serde_json::from_str(payload).unwrap();
        assert_eq!(summary.id, 987654321);
        assert_eq!(summary.activity_type, "Run");
    }

    #[test]
    fn test_token_response_deserializes() {
        let payload = r#"{
            "token_type": "Bearer",
            "access_token": "abc",
            "refresh_token": "def",
            "expires_at": 1700000000
        }"#;

        let token: TokenResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_at, 1700000000);
    }
}
