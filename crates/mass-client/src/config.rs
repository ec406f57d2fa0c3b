//! Connection parameters for a Music Assistant server

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8095;
pub const DEFAULT_USERNAME: &str = "admin";

/// Where and how to reach a Music Assistant server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ssl: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

impl ServerConfig {
    /// Connection to `host` with default port, username, password and TLS setting
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: default_username(),
            password: String::new(),
            ssl: false,
        }
    }

    /// HTTP(S) base URL of the server
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_partial_data() {
        let config: ServerConfig = serde_json::from_value(json!({"host": "mass.local"})).unwrap();
        assert_eq!(config, ServerConfig::new("mass.local"));
        assert_eq!(config.base_url(), "http://mass.local:8095");
    }

    #[test]
    fn test_ssl_base_url() {
        let config: ServerConfig = serde_json::from_value(json!({
            "host": "10.0.0.5",
            "port": 443,
            "username": "dj",
            "password": "secret",
            "ssl": true
        }))
        .unwrap();
        assert_eq!(config.base_url(), "https://10.0.0.5:443");
        assert_eq!(config.username, "dj");
    }
}
