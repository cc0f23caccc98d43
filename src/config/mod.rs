// Configuration module entry point
// Loads layered configuration and holds shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::HostError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, FunctionsConfig, HttpConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config";
pub const ENV_PREFIX: &str = "FNHOST";

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// Missing files are fine: every key has a default and `FNHOST_*` env vars
    /// override both, with `__` between nested keys (`FNHOST_SERVER__PORT`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8888)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.default_content_type", "application/json")?
            .set_default("http.server_name", "fnhost/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 6_291_456)? // 6MB, the Lambda payload cap
            .set_default("functions.base_path", "/.netlify/functions")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, HostError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| HostError::Address { addr, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does/not/exist/fnhost").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8888);
        assert!(cfg.server.workers.is_none());
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.default_content_type, "application/json");
        assert_eq!(cfg.functions.base_path, "/.netlify/functions");
        assert!(cfg.routes.health.enabled);
        assert_eq!(cfg.routes.health.liveness_path, "/healthz");
        assert_eq!(cfg.performance.shutdown_timeout, 10);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does/not/exist/fnhost").unwrap();
        cfg.server.host = "0.0.0.0".to_string();
        cfg.server.port = 9000;
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "0.0.0.0:9000");

        cfg.server.host = "not an ip".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(HostError::Address { .. })
        ));
    }

    #[test]
    fn test_normalized_base_path() {
        let mut functions = FunctionsConfig {
            base_path: "/.netlify/functions/".to_string(),
        };
        assert_eq!(functions.normalized_base_path(), "/.netlify/functions");
        functions.base_path = "api".to_string();
        assert_eq!(functions.normalized_base_path(), "/api");
        functions.base_path = "/".to_string();
        assert_eq!(functions.normalized_base_path(), "");
    }
}
