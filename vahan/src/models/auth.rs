//! Authentication request and response bodies.

use serde::{Deserialize, Serialize};

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup form. `confirm_password` is checked locally and never sent.
#[derive(Debug, Clone, Serialize)]
pub struct SignupDetails {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
}

/// Successful login answer.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
