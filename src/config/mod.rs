// Configuration module entry point
// Layered loading: optional config file, built-in defaults, PORT override

mod state;
mod types;

use std::net::SocketAddr;

use crate::logger;

pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig};

/// Fallback listening port when neither config file nor `PORT` provide one
const DEFAULT_PORT: u16 = 3000;

impl Config {
    /// Load configuration from the default "config.toml" location
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without extension).
    /// The file is optional; missing keys fall back to built-in defaults.
    /// The `PORT` environment variable overrides `server.port`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_port(config_path, port_from_env())
    }

    fn load_with_port(
        config_path: &str,
        port_override: Option<u16>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("site.public_dir", "public")?
            .set_default("site.root_document", "index.html")?
            .set_default(
                "site.index_files",
                vec!["index.html".to_string(), "index.htm".to_string()],
            )?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?;

        if let Some(port) = port_override {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Read the `PORT` environment variable. An unset variable yields no
/// override; a value that is not a valid port is ignored with a warning,
/// so the process still starts on the configured default.
fn port_from_env() -> Option<u16> {
    let raw = std::env::var("PORT").ok()?;
    match parse_port(&raw) {
        Some(port) => Some(port),
        None => {
            logger::log_warning(&format!(
                "Ignoring unparseable PORT value '{raw}', using default {DEFAULT_PORT}"
            ));
            None
        }
    }
}

/// Parse a port number from an environment variable value
fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_accepts_valid_numbers() {
        assert_eq!(parse_port("4321"), Some(4321));
        assert_eq!(parse_port(" 8080 "), Some(8080));
    }

    #[test]
    fn parse_port_rejects_garbage() {
        assert_eq!(parse_port("abc"), None);
        assert_eq!(parse_port(""), None);
        assert_eq!(parse_port("-1"), None);
        assert_eq!(parse_port("70000"), None);
    }

    #[test]
    fn defaults_apply_without_config_file() {
        let cfg = Config::load_with_port("no-such-config-file", None).unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.site.public_dir, "public");
        assert_eq!(cfg.site.root_document, "index.html");
        assert_eq!(cfg.site.index_files, vec!["index.html", "index.htm"]);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.server.workers.is_none());
        assert!(cfg.performance.max_connections.is_none());
    }

    #[test]
    fn port_override_wins_over_default() {
        let cfg = Config::load_with_port("no-such-config-file", Some(4321)).unwrap();
        assert_eq!(cfg.server.port, 4321);
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let cfg = Config::load_with_port("no-such-config-file", Some(4321)).unwrap();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 4321);
        assert!(addr.ip().is_unspecified());
    }
}
