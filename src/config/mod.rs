use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_inline_default::serde_inline_default;

use crate::model::SchemaVersion;

/// Minimum verbosity for emitted log lines, ordered `debug < info < warn < error`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde_inline_default("127.0.0.1".to_string())]
    pub app_host: String,
    #[serde_inline_default(8080)]
    pub app_port: u16,
    #[serde_inline_default(LogLevel::Info)]
    pub log_level: LogLevel,
    pub suri_api_url: Option<String>,
    pub suri_api_token: Option<String>,
    #[serde_inline_default(SchemaVersion::Variants)]
    pub suri_schema: SchemaVersion,
    #[serde_inline_default("default".to_string())]
    pub suri_category_id: String,
    pub bling_webhook_secret: Option<String>,
    #[serde_inline_default(true)]
    pub always_ack: bool,
}

impl Config {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            // a missing .env is the normal case in deployed environments
            if !e.not_found() {
                return Err(anyhow!(e)).context("failed to read .env file");
            }
        }
        envy::from_env::<Config>()
            .map_err(|e| anyhow!(e))
            .context(format!(
                "at {} line {} column {}",
                file!(),
                line!(),
                column!(),
            ))
    }

    /// Builds a config from explicit `(NAME, value)` pairs, same rules as [`Config::load`].
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        envy::from_iter::<_, Config>(vars.into_iter().map(|(k, v)| (k.into(), v.into())))
            .map_err(|e| anyhow!(e))
            .context("invalid configuration")
    }

    /// The chatbot id embedded in the API token as `token:chatbotId`.
    pub fn chatbot_id(&self) -> Option<&str> {
        self.suri_api_token
            .as_deref()
            .and_then(|token| token.split(':').nth(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_vars_are_absent() {
        let cnf = Config::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(cnf.app_host, "127.0.0.1");
        assert_eq!(cnf.app_port, 8080);
        assert_eq!(cnf.log_level, LogLevel::Info);
        assert_eq!(cnf.suri_schema, SchemaVersion::Variants);
        assert_eq!(cnf.suri_category_id, "default");
        assert!(cnf.always_ack);
        assert!(cnf.suri_api_url.is_none());
        assert!(cnf.bling_webhook_secret.is_none());
    }

    #[test]
    fn reads_target_settings() {
        let cnf = Config::from_vars([
            ("SURI_API_URL", "https://api.suri.test/v1"),
            ("SURI_API_TOKEN", "secret:bot-42"),
            ("SURI_SCHEMA", "flat"),
            ("LOG_LEVEL", "warn"),
            ("ALWAYS_ACK", "false"),
        ])
        .unwrap();
        assert_eq!(cnf.suri_api_url.as_deref(), Some("https://api.suri.test/v1"));
        assert_eq!(cnf.suri_schema, SchemaVersion::Flat);
        assert_eq!(cnf.log_level, LogLevel::Warn);
        assert!(!cnf.always_ack);
        assert_eq!(cnf.chatbot_id(), Some("bot-42"));
    }

    #[test]
    fn chatbot_id_absent_without_colon() {
        let cnf = Config::from_vars([("SURI_API_TOKEN", "plain-token")]).unwrap();
        assert_eq!(cnf.chatbot_id(), None);
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(Config::from_vars([("LOG_LEVEL", "verbose")]).is_err());
    }

    #[test]
    fn log_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }
}
