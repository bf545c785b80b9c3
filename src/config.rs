use crate::error::{AppError, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub climate: ClimateConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Custom deserializer that handles port as both number and string
///
/// Accepts:
/// - `port: 8000` (number)
/// - `port: "8000"` (string that parses to number)
/// - `port: ${PORT}` (env var substituted to either)
fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s
            .parse::<u16>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid port number: '{}'", s))),
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    pub api_key: String,
}

fn default_geocoding_url() -> String {
    "http://api.openweathermap.org/geo/1.0/direct".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClimateConfig {
    #[serde(default = "default_climate_url")]
    pub base_url: String,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            base_url: default_climate_url(),
        }
    }
}

fn default_climate_url() -> String {
    "https://archive-api.open-meteo.com/v1/archive".to_string()
}

/// Outbound HTTP behaviour shared by the geocoder and the climate client.
///
/// The defaults leave the transport's own timeout in place and never retry.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("agrocast/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
}

const MAX_RETRIES: u32 = 5;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Unexpanded environment variables
    /// - A usable geocoding API key
    /// - Valid URL formats for both upstream services
    /// - Sane port, timeout and retry values
    fn validate(&self) -> Result<()> {
        let fields_to_check = [
            ("geocoding.api_key", &self.geocoding.api_key),
            ("geocoding.base_url", &self.geocoding.base_url),
            ("climate.base_url", &self.climate.base_url),
        ];

        for (field_name, value) in &fields_to_check {
            if value.contains("${") {
                return Err(AppError::Config(format!(
                    "{} references an environment variable that is not set. \
                     Please set it or create a .env file. \
                     See .env.example for required variables.",
                    field_name
                )));
            }
        }

        if self.geocoding.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Geocoding api_key cannot be empty".to_string(),
            ));
        }

        validate_url("geocoding.base_url", &self.geocoding.base_url)?;
        validate_url("climate.base_url", &self.climate.base_url)?;

        if self.server.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        if self.http.timeout_seconds == Some(0) {
            return Err(AppError::Config(
                "http.timeout_seconds must be greater than 0 when set".to_string(),
            ));
        }

        if self.http.retries > MAX_RETRIES {
            return Err(AppError::Config(format!(
                "http.retries {} is too high, maximum is {}",
                self.http.retries, MAX_RETRIES
            )));
        }

        if self.http.retries > 0 {
            tracing::warn!(
                "Outbound requests will be retried up to {} times on transient failures",
                self.http.retries
            );
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", field, value, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Config(format!(
            "{} must use http or https, got: {}",
            field, other
        ))),
    }
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid substitution pattern: {}", e)))?;

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                if !missing_vars.iter().any(|v| v == var_name) {
                    missing_vars.push(var_name.to_string());
                }
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or set {} in your environment before running",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}
