//! Application state: the auth, document and metrics slices plus the typed
//! actions that drive them.
//!
//! Every action follows the same shape: mark the slice as loading, perform one
//! request, then record either the result or an error message. An
//! authorization failure from any action logs the user out.

mod auth;
mod documents;
mod metrics;
mod persist;

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::api::ApiClient;
use crate::error::{ApiError, StorageError};
use crate::models::{Credentials, SessionId, SignupDetails};
use crate::storage::Storage;

pub use auth::{validate_signup, AuthSlice, MIN_PASSWORD_LEN};
pub use documents::DocumentSlice;
pub use metrics::MetricsSlice;
pub use persist::{load_auth, save_auth};

pub struct AppState {
    storage: Arc<dyn Storage>,
    api: ApiClient,
    pub auth: AuthSlice,
    pub documents: DocumentSlice,
    pub metrics: MetricsSlice,
}

impl AppState {
    /// Build state, restoring the persisted auth snapshot.
    pub fn load(storage: Arc<dyn Storage>, api: ApiClient) -> Self {
        let auth = load_auth(storage.as_ref());
        Self {
            storage,
            api,
            auth,
            documents: DocumentSlice::default(),
            metrics: MetricsSlice::default(),
        }
    }

    // Persistence failures are logged, never fatal.
    fn commit_auth(&self) {
        if let Err(e) = save_auth(self.storage.as_ref(), &self.auth) {
            error!(error = %e, "failed to save auth state");
        }
    }

    fn handle_error(&mut self, err: &ApiError) {
        if err.requires_login() {
            info!("authorization lost, returning to login");
            self.auth.clear();
            self.documents.clear();
            self.commit_auth();
        }
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), ApiError> {
        self.auth.request();
        match self.api.login(credentials).await {
            Ok(response) => {
                info!(user_id = ?response.user_id, "logged in");
                self.auth.login_success(response, &credentials.email);
                self.commit_auth();
                Ok(())
            }
            Err(e) => {
                self.auth.failure(e.to_string());
                self.commit_auth();
                Err(e)
            }
        }
    }

    pub async fn signup(&mut self, details: &SignupDetails) -> Result<(), ApiError> {
        self.auth.request();
        if let Err(message) = validate_signup(details) {
            self.auth.failure(message.clone());
            return Err(ApiError::Validation(message));
        }
        match self.api.signup(details).await {
            Ok(_) => {
                info!(email = %details.email, "signed up");
                self.auth.signup_success();
                self.commit_auth();
                Ok(())
            }
            Err(e) => {
                self.auth.failure(e.to_string());
                self.commit_auth();
                Err(e)
            }
        }
    }

    /// Clear credentials. Chat histories stay on disk.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.auth.clear();
        self.documents.clear();
        save_auth(self.storage.as_ref(), &self.auth)
    }

    pub async fn create_document(&mut self, path: &Path) -> Result<(), ApiError> {
        self.documents.request();
        match self.api.upload_document(path).await {
            Ok(receipt) => {
                info!(file = %path.display(), "document uploaded");
                self.documents.create_success(receipt);
                Ok(())
            }
            Err(e) => self.document_failure(e),
        }
    }

    pub async fn list_documents(&mut self) -> Result<(), ApiError> {
        self.documents.request();
        match self.api.list_documents().await {
            Ok(list) => {
                self.documents.list_success(list.documents);
                Ok(())
            }
            Err(e) => self.document_failure(e),
        }
    }

    pub async fn delete_document(&mut self, filename: &str) -> Result<(), ApiError> {
        self.documents.request();
        match self.api.delete_document(filename).await {
            Ok(()) => {
                info!(%filename, "document deleted");
                self.documents.delete_success(filename);
                Ok(())
            }
            Err(e) => self.document_failure(e),
        }
    }

    fn document_failure(&mut self, err: ApiError) -> Result<(), ApiError> {
        self.handle_error(&err);
        self.documents.failure(err.to_string());
        Err(err)
    }

    pub async fn fetch_metrics(&mut self) -> Result<(), ApiError> {
        self.metrics.request();
        match self.api.fetch_metrics().await {
            Ok(metrics) => {
                self.metrics.metrics_success(metrics);
                Ok(())
            }
            Err(e) => self.metrics_failure(e),
        }
    }

    pub async fn fetch_session_metrics(&mut self, session_id: &SessionId) -> Result<(), ApiError> {
        self.metrics.request();
        match self.api.fetch_session_metrics(session_id).await {
            Ok(session) => {
                self.metrics.session_success(session);
                Ok(())
            }
            Err(e) => self.metrics_failure(e),
        }
    }

    fn metrics_failure(&mut self, err: ApiError) -> Result<(), ApiError> {
        self.handle_error(&err);
        self.metrics.failure(err.to_string());
        Err(err)
    }
}
