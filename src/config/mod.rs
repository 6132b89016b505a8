//! Configuration loading, validation and storage.

mod credentials;
mod loader;
mod store;
mod types;

pub use credentials::{CredentialStatus, SecureString};
pub use loader::ConfigError;
pub use store::ConfigStore;
pub use types::{ApiConfig, AuthConfig, CacheConfig, Config, ListDefaults};
