//! Persistent-store adapter for the auth slice.
//!
//! Saves `{"auth": ...}` under the `state` key after every auth mutation and
//! restores it on startup. The `token` key stays authoritative for the bearer
//! token: a token cleared elsewhere (e.g. a 401 during chat) is not
//! resurrected from an older snapshot.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::auth::AuthSlice;
use crate::error::StorageError;
use crate::storage::{load_json, save_json, Storage, STATE_KEY, TOKEN_KEY};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    auth: AuthSlice,
}

/// Restore the auth slice. Missing or corrupt snapshots yield the default.
pub fn load_auth(storage: &dyn Storage) -> AuthSlice {
    let mut auth = match load_json::<Snapshot>(storage, STATE_KEY) {
        Ok(Some(snapshot)) => snapshot.auth,
        Ok(None) => AuthSlice::default(),
        Err(e) => {
            warn!(error = %e, "discarding unreadable state snapshot");
            AuthSlice::default()
        }
    };

    match storage.get(TOKEN_KEY) {
        Ok(Some(token)) if !token.is_empty() => auth.token = Some(token),
        Ok(_) => {
            if auth.token.is_some() {
                // Snapshot is stale; the token was revoked since it was written.
                auth.clear();
            }
        }
        Err(e) => {
            warn!(error = %e, "could not read stored token");
            auth.clear();
        }
    }
    auth.loading = false;
    auth
}

/// Write the auth snapshot and mirror the token into its own key.
pub fn save_auth(storage: &dyn Storage, auth: &AuthSlice) -> Result<(), StorageError> {
    match &auth.token {
        Some(token) => storage.set(TOKEN_KEY, token)?,
        None => storage.remove(TOKEN_KEY)?,
    }
    save_json(
        storage,
        STATE_KEY,
        &Snapshot { auth: auth.clone() },
    )
}
