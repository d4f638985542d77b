use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use crate::{LLMClient, LLMParams};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_DATABASE_PATH: &str = "perfume_database.json";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Retrieves an environment variable, falling back to `default` when it is unset or blank.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Retrieves and parses an environment variable.
///
/// Unset variables silently use `default`; values that fail to parse are logged and also
/// fall back to `default`.
pub fn get_env_var_parsed<T: FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value for {}: {:?}", var, raw);
                default
            }
        },
        _ => default,
    }
}

/// Which LLM backend the service talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LLMBackend {
    OpenAI,
    Ollama,
}

impl From<&str> for LLMBackend {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ollama" => LLMBackend::Ollama,
            _ => LLMBackend::OpenAI,
        }
    }
}

/// Runtime settings for the web service, read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub backend: LLMBackend,
    pub api_key: Option<String>,
    pub api_base: String,
    pub ollama_host: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            backend: LLMBackend::OpenAI,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = env::var("LLM_API_KEY")
            .or_else(|_| env::var("GROQ_API_KEY"))
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            bind_address: get_env_var_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            port: get_env_var_parsed("PORT", DEFAULT_PORT),
            database_path: PathBuf::from(get_env_var_or(
                "PERFUME_DATABASE_PATH",
                DEFAULT_DATABASE_PATH,
            )),
            static_dir: PathBuf::from(get_env_var_or("STATIC_DIR", DEFAULT_STATIC_DIR)),
            backend: LLMBackend::from(get_env_var_or("LLM_TYPE", "openai").as_str()),
            api_key,
            api_base: get_env_var_or("LLM_API_BASE", DEFAULT_API_BASE),
            ollama_host: get_env_var_or("OLLAMA_HOST", DEFAULT_OLLAMA_HOST),
            model: get_env_var_or("LLM_MODEL", DEFAULT_MODEL),
            temperature: get_env_var_parsed("LLM_TEMPERATURE", DEFAULT_TEMPERATURE),
            max_tokens: get_env_var_parsed("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            timeout_secs: get_env_var_parsed("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Builds the LLM parameters for this configuration.
    ///
    /// Returns `None` when the OpenAI-compatible backend is selected but no API key is
    /// available; the service keeps running and reports the problem on each request.
    pub fn llm_params(&self) -> Option<LLMParams> {
        let llm_client = match self.backend {
            LLMBackend::OpenAI => {
                let Some(api_key) = self.api_key.as_deref() else {
                    warn!("No LLM_API_KEY or GROQ_API_KEY set, note extraction is disabled");
                    return None;
                };
                info!("Using OpenAI-compatible API at {}", self.api_base);
                let config = OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(&self.api_base);
                LLMClient::OpenAI(OpenAIClient::with_config(config))
            }
            LLMBackend::Ollama => {
                let (host, port) = split_ollama_host(&self.ollama_host);
                info!("Connecting to Ollama at {}:{}", host, port);
                LLMClient::Ollama(Ollama::new(host, port))
            }
        };

        Some(LLMParams {
            llm_client,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        })
    }
}

/// Splits an Ollama URL such as `http://gpu-box:11434` into the host part (scheme kept) and
/// the port.
pub fn split_ollama_host(host_url: &str) -> (String, u16) {
    let (scheme, rest) = match host_url.split_once("://") {
        Some((scheme, rest)) => (format!("{}://", scheme), rest),
        None => ("http://".to_string(), host_url),
    };
    let rest = rest.trim_end_matches('/');

    match rest.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (format!("{}{}", scheme, host), port),
            Err(_) => (format!("{}{}", scheme, rest), DEFAULT_OLLAMA_PORT),
        },
        None => (format!("{}{}", scheme, rest), DEFAULT_OLLAMA_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ollama_host() {
        assert_eq!(
            split_ollama_host("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            split_ollama_host("gpu-box:8080/"),
            ("http://gpu-box".to_string(), 8080)
        );
        assert_eq!(
            split_ollama_host("https://ollama.internal"),
            ("https://ollama.internal".to_string(), DEFAULT_OLLAMA_PORT)
        );
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(LLMBackend::from("Ollama"), LLMBackend::Ollama);
        assert_eq!(LLMBackend::from("openai"), LLMBackend::OpenAI);
        assert_eq!(LLMBackend::from("groq"), LLMBackend::OpenAI);
    }

    #[test]
    fn test_missing_api_key_disables_llm() {
        let config = Config::default();
        assert!(config.llm_params().is_none());

        let config = Config {
            backend: LLMBackend::Ollama,
            ..Config::default()
        };
        let params = config.llm_params().expect("ollama needs no key");
        assert_eq!(params.model, DEFAULT_MODEL);
        assert_eq!(params.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
