use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::TryOnApi;
use crate::error::TryOnError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub username: Option<String>,
    pub authenticated: bool,
}

#[derive(Default)]
pub struct AuthSession {
    state: RwLock<AuthState>,
}

impl AuthSession {
    pub fn snapshot(&self) -> AuthState { self.state.read().clone() }

    /// Returns the server's confirmation text. A rejected login leaves the session as it was.
    pub async fn login(&self, api: &dyn TryOnApi, username: &str, password: &str) -> Result<String, TryOnError> {
        match api.login(username, password).await {
            Ok(reply) => {
                *self.state.write() = AuthState { username: Some(username.to_string()), authenticated: true };
                info!("✅ Logged in as '{}'", username);
                Ok(reply.detail.unwrap_or_else(|| "Login Successful".to_string()))
            }
            Err(e) => {
                warn!("⚠️ Login for '{}' rejected: {}", username, e);
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        *self.state.write() = AuthState::default();
    }
}
