//! Credential resolution from configuration.
//!
//! Session tokens come from the config file or an environment variable
//! and are resolved at runtime, never cached in plain form.

use super::types::AuthConfig;

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for API calls.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually sending to APIs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}

/// Status of token resolution.
#[derive(Debug, Clone)]
pub enum CredentialStatus {
    /// Token resolved successfully.
    Configured(SecureString),
    /// Token is missing or empty.
    Unconfigured {
        /// Reason for missing configuration.
        reason: String,
    },
}

impl AuthConfig {
    /// Resolve the session token.
    ///
    /// The inline `token` wins over the environment variable. Empty values
    /// count as missing.
    pub fn resolve_credential(&self) -> CredentialStatus {
        if let Some(ref token) = self.token {
            if !token.trim().is_empty() {
                return CredentialStatus::Configured(SecureString::new(token.trim().to_string()));
            }
        }

        match std::env::var(&self.token_env_var) {
            Ok(value) if !value.trim().is_empty() => {
                CredentialStatus::Configured(SecureString::new(value.trim().to_string()))
            }
            _ => CredentialStatus::Unconfigured {
                reason: format!("auth.token is not set and ${} is empty", self.token_env_var),
            },
        }
    }
}
