//! Authentication slice: token, identity and request status.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{LoginResponse, SignupDetails};

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSlice {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Request in flight. Never persisted.
    #[serde(skip)]
    pub loading: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Set after a successful signup until the next login.
    #[serde(default)]
    pub signed_up: bool,
}

impl AuthSlice {
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn request(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn login_success(&mut self, response: LoginResponse, email: &str) {
        self.token = Some(response.access_token);
        self.user_id = response.user_id;
        self.email = Some(email.to_string());
        self.loading = false;
        self.error = None;
        self.signed_up = false;
    }

    pub fn signup_success(&mut self) {
        self.loading = false;
        self.error = None;
        self.signed_up = true;
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Logged-out state. Keeps nothing from the previous identity.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Local checks run before a signup request is issued.
pub fn validate_signup(details: &SignupDetails) -> Result<(), String> {
    if details.name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if !EMAIL_RE.is_match(details.email.trim()) {
        return Err("Please enter a valid email address".to_string());
    }
    if details.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    if details.password != details.confirm_password {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}
