// Configuration for scrolltape
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/scrolltape/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the web server to
    pub bind_addr: SocketAddr,

    /// Console calibration capture window in seconds
    /// (console policy; the web front end finishes on operator click)
    pub capture_window_secs: u64,

    /// Demo mode: synthetic scroll ticks instead of terminal capture
    pub demo_mode: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    bind_addr: Option<String>,
    capture_window_secs: Option<u64>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/scrolltape/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("scrolltape").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# scrolltape configuration
# Uncomment and modify options as needed

# Web server bind address (default: 127.0.0.1:5000)
# bind_addr = "127.0.0.1:5000"

# Console calibration capture window in seconds (default: 10)
# capture_window_secs = 10

# Logging configuration
# [logging]
# level = "info"  # trace, debug, info, warn, error (RUST_LOG env var overrides this)
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# scrolltape configuration

# Web server bind address
bind_addr = "{bind}"

# Console calibration capture window in seconds
capture_window_secs = {window}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
"#,
            bind = self.bind_addr,
            window = self.capture_window_secs,
            log_level = self.logging.level,
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Bind address: env > file > default (original service port)
        let bind_addr = std::env::var("SCROLLTAPE_BIND")
            .ok()
            .or(file.bind_addr)
            .unwrap_or_else(|| "127.0.0.1:5000".to_string())
            .parse()
            .expect("Invalid bind address");

        // Capture window: env > file > default
        let capture_window_secs = std::env::var("SCROLLTAPE_CAPTURE_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.capture_window_secs)
            .unwrap_or(10);

        // Demo mode: env only (runtime flag; also settable via --demo)
        let demo_mode = std::env::var("SCROLLTAPE_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
        };

        Self {
            bind_addr,
            capture_window_secs,
            demo_mode,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".parse().unwrap(),
            capture_window_secs: 10,
            demo_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that serialized config can be parsed back.
    /// Catches TOML syntax errors in the to_toml template.
    #[test]
    fn test_config_roundtrip_default() {
        let config = Config::default();
        let toml_str = config.to_toml();

        let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
        assert!(
            parsed.is_ok(),
            "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
            toml_str,
            parsed.err()
        );
    }

    #[test]
    fn test_file_config_parses_partial_sections() {
        let parsed: FileConfig = toml::from_str(
            r#"
            capture_window_secs = 15

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.capture_window_secs, Some(15));
        assert_eq!(parsed.bind_addr, None);
        assert_eq!(parsed.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_file_config_uses_all_defaults() {
        let parsed: FileConfig = toml::from_str("").unwrap();
        assert!(parsed.bind_addr.is_none());
        assert!(parsed.capture_window_secs.is_none());
        assert!(parsed.logging.is_none());
    }
}
