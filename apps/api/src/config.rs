use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Every variable is optional; a missing API key disables the generation service.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout: Duration,
    pub enable_llm_actions: bool,
    pub allow_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 60,
        };

        let enable_llm_actions = match get("ENABLE_LLM_ACTIONS") {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("ENABLE_LLM_ACTIONS must be true/false, got '{raw}'"))?,
            None => true,
        };

        Ok(Config {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            enable_llm_actions,
            allow_origins: get("ALLOW_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allow_origins.is_empty() || self.allow_origins.iter().any(|o| o == "*")
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm_timeout, Duration::from_secs(60));
        assert!(config.enable_llm_actions);
        assert!(config.allows_any_origin());
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_origin_list_is_split_and_trimmed() {
        let config = config_from(&[(
            "ALLOW_ORIGINS",
            "http://localhost:8501, https://app.example.com",
        )])
        .unwrap();
        assert_eq!(
            config.allow_origins,
            vec!["http://localhost:8501", "https://app.example.com"]
        );
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let config = config_from(&[("OPENAI_BASE_URL", "http://localhost:11434/v1/")]).unwrap();
        assert_eq!(config.openai_base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(config_from(&[("LLM_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_llm_actions_flag_parses() {
        let config = config_from(&[("ENABLE_LLM_ACTIONS", "off")]).unwrap();
        assert!(!config.enable_llm_actions);
        assert!(config_from(&[("ENABLE_LLM_ACTIONS", "maybe")]).is_err());
    }
}
