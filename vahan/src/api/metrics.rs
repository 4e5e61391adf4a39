//! Metrics endpoints.

use reqwest::Method;
use serde_json::Value;

use super::client::{Auth, ApiClient};
use crate::error::ApiError;
use crate::models::{ModelMetrics, SessionId, SessionMetrics};

impl ApiClient {
    /// `GET /api/metrics`. The backend reports failures as `{"error": ...}`
    /// with a 200 status; those become `ApiError::Remote`.
    pub async fn fetch_metrics(&self) -> Result<ModelMetrics, ApiError> {
        let request = self.request(Method::GET, "metrics", Auth::Bearer)?;
        let response = self
            .send(request, Auth::Bearer, "Failed to fetch metrics")
            .await?;
        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ApiError::Remote(error.to_string()));
        }
        serde_json::from_value(body)
            .map_err(|e| ApiError::Remote(format!("unexpected metrics payload: {e}")))
    }

    /// `GET /api/metrics/sessions/{session_id}`.
    pub async fn fetch_session_metrics(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionMetrics, ApiError> {
        let path = format!("metrics/sessions/{}", urlencoding::encode(session_id.as_str()));
        let request = self.request(Method::GET, &path, Auth::Bearer)?;
        let response = self
            .send(request, Auth::Bearer, "Failed to fetch session metrics")
            .await?;
        Ok(response.json().await?)
    }
}
