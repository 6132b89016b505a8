//! Local session token and the route gate in front of it.
//!
//! Authentication happens at an external service. This side only checks
//! whether a token is present, attaches it to requests, and forgets it
//! when the API answers 401/403.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Url;

use crate::client::ApiError;
use crate::config::{AuthConfig, CredentialStatus, SecureString};

/// Shared holder for the current bearer token.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<SecureString>>>,
}

impl Session {
    pub fn new(token: Option<SecureString>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        match auth.resolve_credential() {
            CredentialStatus::Configured(token) => Self::new(Some(token)),
            CredentialStatus::Unconfigured { reason } => {
                tracing::debug!(%reason, "Starting without a session token");
                Self::new(None)
            }
        }
    }

    pub fn token(&self) -> Option<SecureString> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Forget the token. Returns false if there was none.
    pub fn clear(&self) -> bool {
        let cleared = self.token.write().take().is_some();
        if cleared {
            tracing::info!("Session token cleared");
        }
        cleared
    }

    /// Drop the token when `err` is an authorization failure.
    ///
    /// Returns true only when this call ended a session; repeated 401s
    /// on an already anonymous session return false.
    pub fn handle_error(&self, err: &ApiError) -> bool {
        err.requires_reauth() && self.clear()
    }
}

/// Outcome of a route check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allowed,
    /// Send the user to this login URL.
    Redirect(String),
}

/// Route gate: public routes pass, everything else needs a token.
#[derive(Debug, Clone)]
pub struct SessionGate {
    login_url: String,
    public_routes: Vec<String>,
}

impl SessionGate {
    pub fn new(login_url: impl Into<String>, public_routes: Vec<String>) -> Self {
        Self {
            login_url: login_url.into(),
            public_routes,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(auth.login_url.clone(), auth.public_routes.clone())
    }

    pub fn is_public(&self, route: &str) -> bool {
        let path = route.split(['?', '#']).next().unwrap_or(route);
        self.public_routes.iter().any(|public| {
            path.strip_prefix(public.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn check(&self, session: &Session, route: &str) -> Access {
        if self.is_public(route) || session.is_authenticated() {
            Access::Allowed
        } else {
            Access::Redirect(self.login_redirect(route))
        }
    }

    /// Login URL carrying `route` as `returnUrl`.
    pub fn login_redirect(&self, route: &str) -> String {
        match Url::parse_with_params(&self.login_url, &[("returnUrl", route)]) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(login_url = %self.login_url, error = %e, "Invalid login URL");
                self.login_url.clone()
            }
        }
    }
}
