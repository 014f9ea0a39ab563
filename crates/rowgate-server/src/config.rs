use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Spreadsheet backend configuration
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Sheets validations
        if self.sheets.default_sheet.trim().is_empty() {
            return Err("sheets.default_sheet must not be empty".into());
        }
        if self.sheets.request_timeout_ms == Some(0) {
            return Err("sheets.request_timeout_ms must be > 0 when set".into());
        }
        if self.sheets.backend == SheetsBackend::Google
            && self
                .sheets
                .spreadsheet_id
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
        {
            return Err(
                "sheets.spreadsheet_id (or SPREADSHEET_ID) is required for the google backend"
                    .into(),
            );
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Which store the gateway forwards rows to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SheetsBackend {
    /// Google Sheets API v4
    #[default]
    Google,
    /// Process-local store, for development only
    Memory,
}

/// Spreadsheet backend configuration
///
/// Credentials can be given inline or as a file path. The legacy variables
/// `GOOGLE_CREDENTIALS`, `GOOGLE_APPLICATION_CREDENTIALS` and `SPREADSHEET_ID`
/// map onto these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub backend: SheetsBackend,

    /// Target spreadsheet identifier
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Service account key as a JSON document. Takes precedence over `credentials_file`.
    #[serde(default)]
    pub credentials_json: Option<String>,

    /// Path to a service account key file
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Sheet used by the endpoints without a `{sheet_name}` segment
    #[serde(default = "default_sheet")]
    pub default_sheet: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-call timeout for remote requests. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Sheets created at startup by the memory backend, besides `default_sheet`
    #[serde(default)]
    pub memory_sheets: Vec<String>,

    /// Exit at startup if the backend cannot be initialized. When false the
    /// server starts anyway and every row operation reports the failure.
    #[serde(default = "default_require_credentials")]
    pub require_credentials: bool,
}

fn default_sheet() -> String {
    "Sheet1".into()
}
fn default_api_base_url() -> String {
    rowgate_sheets::DEFAULT_API_BASE_URL.into()
}
fn default_require_credentials() -> bool {
    true
}

impl SheetsConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            backend: SheetsBackend::default(),
            spreadsheet_id: None,
            credentials_json: None,
            credentials_file: None,
            default_sheet: default_sheet(),
            api_base_url: default_api_base_url(),
            request_timeout_ms: None,
            memory_sheets: Vec::new(),
            require_credentials: default_require_credentials(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Default configuration file looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "rowgate.toml";

    /// Flat variables kept for deployments configured the old way.
    const LEGACY_VARS: [(&str, &str); 4] = [
        ("PORT", "server.port"),
        ("SPREADSHEET_ID", "sheets.spreadsheet_id"),
        ("GOOGLE_CREDENTIALS", "sheets.credentials_json"),
        ("GOOGLE_APPLICATION_CREDENTIALS", "sheets.credentials_file"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        load_config_with_env(path, None)
    }

    /// Loads configuration, reading variables from `vars` instead of the
    /// process environment when given.
    ///
    /// Precedence, lowest first: defaults, file, `ROWGATE__*`, legacy flat
    /// variables.
    pub fn load_config_with_env(
        path: Option<&str>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        } else if path.is_some() {
            tracing::warn!(path = %pathbuf.display(), "Configuration file not found, using defaults");
        }
        // Environment variable overrides, e.g., ROWGATE__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("ROWGATE")
                .try_parsing(true)
                .separator("__")
                .source(vars.clone()),
        );
        for (var, key) in LEGACY_VARS {
            let value = match &vars {
                Some(map) => map.get(var).cloned(),
                None => std::env::var(var).ok(),
            };
            builder = builder
                .set_override_option(key, value.filter(|v| !v.is_empty()))
                .map_err(|e| format!("config override error for {var}: {e}"))?;
        }
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}
