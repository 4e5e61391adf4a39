//! Shared request plumbing: base URL, bearer header and error mapping.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::storage::{Storage, TOKEN_KEY};

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    /// Login/signup: no token, and 401 is an ordinary failure.
    Anonymous,
    /// Requires a stored token; a 401 clears it.
    Bearer,
}

/// HTTP client bound to one backend and one token store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    pub fn new(
        base: &Url,
        storage: Arc<dyn Storage>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base: base.as_str().trim_end_matches('/').to_string(),
            storage,
        })
    }

    /// Absolute URL for an `/api/...` route.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> Result<RequestBuilder, ApiError> {
        let builder = self.http.request(method, self.endpoint(path));
        match auth {
            Auth::Anonymous => Ok(builder),
            Auth::Bearer => {
                let token = self.token()?.ok_or(ApiError::MissingToken)?;
                Ok(builder.bearer_auth(token))
            }
        }
    }

    /// Send a request and map non-success statuses to `ApiError`.
    ///
    /// For bearer requests a 401 removes the stored token before returning
    /// `ApiError::Unauthorized`. `fallback` is used when the body carries no
    /// usable message.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        auth: Auth,
        fallback: &str,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "api response");

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            warn!("token rejected by server, clearing credentials");
            self.storage.remove(TOKEN_KEY)?;
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| fallback.to_string()),
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"message": "..."}` and `{"error": "..."}`.
/// Structured `detail` arrays (validation errors) are joined by their `msg`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message", "error"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) => {
                let joined: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !joined.is_empty() {
                    return Some(joined.join("; "));
                }
            }
            _ => {}
        }
    }
    None
}
