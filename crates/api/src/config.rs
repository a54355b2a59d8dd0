use std::time::Duration;

use reelgen_core::poll::PollPolicy;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`). Generation
    /// requests poll the provider inside the request, so this must
    /// exceed the poll budget in `GenerationConfig`.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `600`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Provider and polling configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Provider base URL, e.g. `https://api.provider.example`.
    pub provider_api_url: String,
    /// Provider API key.
    pub provider_api_key: String,
    /// Provider model identifier.
    pub provider_model: String,
    /// Seconds between operation polls.
    pub poll_interval_secs: u64,
    /// Maximum total seconds to wait for an operation.
    pub max_wait_secs: u64,
}

impl GenerationConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default              |
    /// |------------------------------|----------------------|
    /// | `PROVIDER_API_URL`           | (required)           |
    /// | `PROVIDER_API_KEY`           | (required)           |
    /// | `PROVIDER_MODEL`             | `scene-video-1`      |
    /// | `GENERATION_POLL_INTERVAL_SECS` | `5`               |
    /// | `GENERATION_MAX_WAIT_SECS`   | `300`                |
    pub fn from_env() -> Self {
        let provider_api_url =
            std::env::var("PROVIDER_API_URL").expect("PROVIDER_API_URL must be set");
        let provider_api_key =
            std::env::var("PROVIDER_API_KEY").expect("PROVIDER_API_KEY must be set");
        let provider_model =
            std::env::var("PROVIDER_MODEL").unwrap_or_else(|_| "scene-video-1".into());

        let poll_interval_secs: u64 = std::env::var("GENERATION_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("GENERATION_POLL_INTERVAL_SECS must be a valid u64");

        let max_wait_secs: u64 = std::env::var("GENERATION_MAX_WAIT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("GENERATION_MAX_WAIT_SECS must be a valid u64");

        Self {
            provider_api_url,
            provider_api_key,
            provider_model,
            poll_interval_secs,
            max_wait_secs,
        }
    }

    /// Polling policy derived from this configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::with_max_wait(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.max_wait_secs),
        )
    }
}
