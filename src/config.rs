//! qrforge runtime configuration handling

use crate::error::{Error, Result};
use crate::qr::QrRenderOptions;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// HTTP server binding configuration
    pub server: ServerOptions,
    /// Application behavior overrides
    pub app: AppOptions,
    /// QR rendering overrides
    pub qr: QrOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl ForgeConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrforge.toml / qrforge.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrforge.toml", "qrforge.yaml", "qrforge.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrforge");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.server.apply_env_overrides();
        self.app.apply_env_overrides();
        self.qr.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Produce resolved rendering options for the encoder.
    pub fn render_options(&self) -> Result<QrRenderOptions> {
        self.qr.to_render_options()
    }
}

/// HTTP binding configuration for the studio server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Bind address for the HTTP server
    pub bind_address: String,
    /// Bind port for the HTTP server
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8750,
        }
    }
}

impl ServerOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(addr) = env::var("QRFORGE_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(port) = env::var("QRFORGE_BIND_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                self.port = parsed;
            }
        }
    }

    /// Socket address helper for binding the listener
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Application-level behavior overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    /// Base URL prefixed onto every QR payload
    pub base_url: String,
    /// Path to the optional logo overlay asset
    pub logo_path: PathBuf,
    /// Path to the optional welcome audio asset
    pub audio_path: PathBuf,
    /// Hosted-context marker; suppresses local speech output when set
    pub hosted: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            base_url: "https://your-app-name.streamlit.app".to_string(),
            logo_path: PathBuf::from("logo.png"),
            audio_path: PathBuf::from("welcome.mp3"),
            hosted: false,
        }
    }
}

impl AppOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("QRFORGE_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(path) = env::var("QRFORGE_LOGO") {
            self.logo_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("QRFORGE_AUDIO") {
            self.audio_path = PathBuf::from(path);
        }
        if env::var_os("QRFORGE_HOSTED").is_some() {
            self.hosted = true;
        }
    }
}

/// User-friendly QR rendering overrides merged onto `QrRenderOptions::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrOptions {
    /// Override for module size in pixels
    pub module_size: Option<u32>,
    /// Override for quiet zone rendering
    pub quiet_zone: Option<bool>,
    /// Override for error correction level (l/m/q/h)
    pub ec_level: Option<String>,
}

impl QrOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("QRFORGE_QR_MODULE_SIZE") {
            self.module_size = size.parse::<u32>().ok();
        }
        if let Ok(level) = env::var("QRFORGE_QR_EC_LEVEL") {
            self.ec_level = Some(level);
        }
    }

    /// Merge overrides onto the default rendering options.
    pub fn to_render_options(&self) -> Result<QrRenderOptions> {
        let mut options = QrRenderOptions::default();

        if let Some(size) = self.module_size {
            options.module_size = size.max(1);
        }

        if let Some(quiet_zone) = self.quiet_zone {
            options.quiet_zone = quiet_zone;
        }

        if let Some(level) = &self.ec_level {
            options.ec_level = match level.to_ascii_lowercase().as_str() {
                "l" => qrcode::EcLevel::L,
                "m" => qrcode::EcLevel::M,
                "q" => qrcode::EcLevel::Q,
                "h" => qrcode::EcLevel::H,
                other => {
                    return Err(Error::Config(format!(
                        "Unknown error correction level '{}'. Use l, m, q, or h",
                        other
                    )));
                }
            };
        }

        Ok(options)
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRFORGE_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stdout logging
    pub color: bool,
    /// Enable periodic metrics summaries over tracing
    pub metrics: bool,
    /// Interval in seconds for emitting aggregated metrics when enabled
    pub metrics_interval_secs: u64,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            metrics: false,
            metrics_interval_secs: 60,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("QRFORGE_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("QRFORGE_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRFORGE_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(metrics) = env::var("QRFORGE_LOG_METRICS") {
            match metrics.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.metrics = true,
                "0" | "false" | "off" => self.metrics = false,
                _ => {}
            }
        }
        if let Ok(interval) = env::var("QRFORGE_LOG_METRICS_INTERVAL") {
            if let Ok(value) = interval.parse::<u64>() {
                self.metrics_interval_secs = value.max(5);
            }
        }
        if let Ok(rotation) = env::var("QRFORGE_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::from_str(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = ForgeConfig::default();
        assert_eq!(config.app.base_url, "https://your-app-name.streamlit.app");
        assert_eq!(config.app.logo_path, PathBuf::from("logo.png"));
        assert_eq!(config.app.audio_path, PathBuf::from("welcome.mp3"));
        assert_eq!(config.server.socket_address(), "127.0.0.1:8750");
    }

    #[test]
    fn qr_overrides_merge_onto_defaults() {
        let options = QrOptions {
            module_size: Some(4),
            quiet_zone: Some(false),
            ec_level: Some("h".to_string()),
        };
        let resolved = options.to_render_options().unwrap();
        assert_eq!(resolved.module_size, 4);
        assert!(!resolved.quiet_zone);
        assert_eq!(resolved.ec_level, qrcode::EcLevel::H);
    }

    #[test]
    fn bad_ec_level_is_a_config_error() {
        let options = QrOptions {
            ec_level: Some("x".to_string()),
            ..QrOptions::default()
        };
        assert!(options.to_render_options().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = ForgeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ForgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.app.base_url, config.app.base_url);
    }
}
