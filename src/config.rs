/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// bcrypt work factor for stored passwords.
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            log_filter: std::env::var("CHESS_LOG").unwrap_or(defaults.log_filter),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|c| (4u32..=31u32).contains(c)) // bcrypt MIN_COST..=MAX_COST (private in bcrypt 0.17)
                .unwrap_or(defaults.bcrypt_cost),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            log_filter: "chess_arena=info,tower_http=info".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8082);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:8082");
        assert!(config.log_filter.starts_with("chess_arena="));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn from_env_defaults() {
        // Without setting env vars, should fall back to defaults
        let config = AppConfig::from_env();
        assert_eq!(config.port, 8082);
        assert_eq!(config.host, "0.0.0.0");
    }
}
