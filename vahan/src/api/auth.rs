//! Login and signup endpoints.

use reqwest::Method;
use serde_json::Value;

use super::client::{Auth, ApiClient};
use crate::error::ApiError;
use crate::models::{Credentials, LoginResponse, SignupDetails};

impl ApiClient {
    /// `POST /api/login`. Does not store the token; the auth slice does.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, "login", Auth::Anonymous)?
            .json(credentials);
        let response = self.send(request, Auth::Anonymous, "Login failed").await?;
        Ok(response.json().await?)
    }

    /// `POST /api/signup`.
    pub async fn signup(&self, details: &SignupDetails) -> Result<Value, ApiError> {
        let request = self
            .request(Method::POST, "signup", Auth::Anonymous)?
            .json(details);
        let response = self.send(request, Auth::Anonymous, "Signup failed").await?;
        // Some deployments answer with an empty body.
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}
