use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env(value: Option<String>) -> Self {
        match value
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" | "bunyan" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub whatsapp_token: Option<String>,
    pub verify_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub whatsapp_api_base: String,
    pub whatsapp_api_version: String,
    /// When set, POST /webhook bodies must carry a valid X-Hub-Signature-256.
    pub app_secret: Option<String>,
    pub category_table_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            whatsapp_token: None,
            verify_token: None,
            phone_number_id: None,
            whatsapp_api_base: "https://graph.facebook.com".to_string(),
            whatsapp_api_version: "v18.0".to_string(),
            app_secret: None,
            category_table_path: None,
            log_format: LogFormat::Pretty,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", &defaults.host),
            port: env_parse_or("PORT", defaults.port),
            whatsapp_token: env_opt("WHATSAPP_TOKEN"),
            verify_token: env_opt("VERIFY_TOKEN"),
            phone_number_id: env_opt("PHONE_NUMBER_ID"),
            whatsapp_api_base: env_or("WHATSAPP_API_BASE", &defaults.whatsapp_api_base)
                .trim_end_matches('/')
                .to_string(),
            whatsapp_api_version: env_or("WHATSAPP_API_VERSION", &defaults.whatsapp_api_version),
            app_secret: env_opt("WHATSAPP_APP_SECRET"),
            category_table_path: env_opt("CATEGORY_TABLE_PATH").map(PathBuf::from),
            log_format: LogFormat::from_env(env_opt("LOG_FORMAT")),
            request_timeout: Duration::from_secs(env_parse_or("REQUEST_TIMEOUT_SECS", 30)),
        }
    }

    pub fn whatsapp_configured(&self) -> bool {
        self.whatsapp_token.is_some() && self.phone_number_id.is_some()
    }

    /// Cloud API endpoint for sending messages from the configured number.
    pub fn messages_url(&self) -> Option<String> {
        let phone_id = self.phone_number_id.as_deref()?;
        Some(format!(
            "{}/{}/{}/messages",
            self.whatsapp_api_base, self.whatsapp_api_version, phone_id
        ))
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

// Runs before tracing is installed, so bad values fall back silently.
fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}
