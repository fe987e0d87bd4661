use std::time::Duration;

/// Headroom on top of the pipeline's capability budget for waiting on the
/// tracker lock.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to finish after shutdown starts
    /// (default: `10`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `10`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
        }
    }

    /// Raise the request timeout so `POST /predict` cannot time out while its
    /// reading is still within the pipeline's capability timeouts.
    pub fn cover_pipeline_budget(&mut self, budget: Duration) {
        let required = (budget + REQUEST_TIMEOUT_SLACK).as_secs_f64().ceil() as u64;
        if self.request_timeout_secs < required {
            tracing::warn!(
                configured = self.request_timeout_secs,
                required,
                "REQUEST_TIMEOUT_SECS is shorter than the pipeline capability timeouts, raising it"
            );
            self.request_timeout_secs = required;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(request_timeout_secs: u64) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs,
            shutdown_timeout_secs: 5,
        }
    }

    #[test]
    fn short_request_timeout_is_raised() {
        let mut config = config(30);
        config.cover_pipeline_budget(Duration::from_secs(37));
        assert_eq!(config.request_timeout_secs, 42);
    }

    #[test]
    fn fractional_budget_rounds_up() {
        let mut config = config(1);
        config.cover_pipeline_budget(Duration::from_millis(2_500));
        assert_eq!(config.request_timeout_secs, 8);
    }

    #[test]
    fn sufficient_request_timeout_is_kept() {
        let mut config = config(60);
        config.cover_pipeline_budget(Duration::from_secs(37));
        assert_eq!(config.request_timeout_secs, 60);
    }
}
