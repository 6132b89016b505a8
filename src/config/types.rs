use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub list: ListDefaults,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Backend API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the REST API (e.g., "https://api.example.com/v1").
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Value sent in the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Session token settings. Authentication itself happens elsewhere;
/// this only tells the client where to find a token and where to send
/// users who have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token placed directly in the config file.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable consulted when `token` is unset.
    #[serde(default = "default_token_env_var")]
    pub token_env_var: String,
    /// External login page that receives a `returnUrl` parameter.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Routes reachable without a token.
    #[serde(default = "default_public_routes")]
    pub public_routes: Vec<String>,
}

/// Defaults applied to freshly initialized list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDefaults {
    /// Page size used when a screen does not choose one (default: 20).
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Upper bound accepted for `limit` (default: 100).
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

/// Query cache freshness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which a cached result is refetched on next read (default: 30).
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
    /// Age after which `collect_garbage` drops an entry (default: 300).
    #[serde(default = "default_gc_after")]
    pub gc_after_seconds: u64,
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_user_agent() -> String {
    concat!("erpview/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_token_env_var() -> String {
    "ERPVIEW_TOKEN".to_string()
}

fn default_login_url() -> String {
    "https://auth.example.com/login".to_string()
}

fn default_public_routes() -> Vec<String> {
    vec!["/login".to_string(), "/signup".to_string(), "/public".to_string()]
}

fn default_limit() -> u32 {
    20
}

fn default_max_limit() -> u32 {
    100
}

fn default_stale_after() -> u64 {
    30
}

fn default_gc_after() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env_var: default_token_env_var(),
            login_url: default_login_url(),
            public_routes: default_public_routes(),
        }
    }
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after_seconds: default_stale_after(),
            gc_after_seconds: default_gc_after(),
        }
    }
}
