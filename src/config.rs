//! Environment-driven configuration.
//!
//! `main` loads `.env` with `dotenvy` before calling [`AppConfig::from_env`].
//! Missing variables fall back to defaults; only malformed ones are errors.

use std::env;

use reqwest::Url;
use secrecy::SecretString;

use crate::connection::ConnectionParams;
use crate::error::ConfigError;
use crate::llm::{ollama, openai, CompletionClient, OllamaClient, OpenAiClient};

pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_SAMPLE_ROWS: u32 = 3;

/// Which completion backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    OpenAi {
        base_url: String,
    },
    Ollama {
        url: Url,
    },
}

pub struct AppConfig {
    pub provider: Provider,
    pub model: String,
    pub max_tokens: u32,
    pub sample_rows: u32,
    /// Not validated here; a missing key surfaces on the first completion.
    pub openai_api_key: Option<SecretString>,
    /// Pre-filled values for the connection form.
    pub connection_defaults: ConnectionParams,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_name = get("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string());
        let (provider, default_model) = match provider_name.trim().to_lowercase().as_str() {
            "openai" => (
                Provider::OpenAi {
                    base_url: get("OPENAI_BASE_URL")
                        .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
                },
                openai::DEFAULT_MODEL,
            ),
            "ollama" => (
                Provider::Ollama {
                    url: ollama_url(
                        get("OLLAMA_HOST").as_deref(),
                        parse_optional_number(&get, "OLLAMA_PORT")?,
                    )?,
                },
                ollama::DEFAULT_MODEL,
            ),
            _ => return Err(ConfigError::UnknownProvider(provider_name)),
        };

        let connection_defaults = ConnectionParams {
            host: get("MYSQL_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: get("MYSQL_PORT").unwrap_or_else(|| "3306".to_string()),
            user: get("MYSQL_USER").unwrap_or_default(),
            password: SecretString::from(lookup("MYSQL_PASSWORD").unwrap_or_default()),
            database: get("MYSQL_DATABASE").unwrap_or_default(),
        };

        Ok(Self {
            provider,
            model: get("LLM_MODEL").unwrap_or_else(|| default_model.to_string()),
            max_tokens: parse_number(&get, "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            sample_rows: parse_number(&get, "SCHEMA_SAMPLE_ROWS", DEFAULT_SAMPLE_ROWS)?,
            openai_api_key: get("OPENAI_API_KEY").map(SecretString::from),
            connection_defaults,
        })
    }

    /// Construct the configured completion backend.
    pub fn completion_client(&self) -> Box<dyn CompletionClient> {
        match &self.provider {
            Provider::OpenAi { base_url } => Box::new(OpenAiClient::new(
                self.openai_api_key.clone(),
                base_url.clone(),
                self.model.clone(),
            )),
            Provider::Ollama { url } => {
                Box::new(OllamaClient::new(url.clone(), self.model.clone()))
            }
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            Provider::OpenAi { .. } => "openai",
            Provider::Ollama { .. } => "ollama",
        }
    }
}

fn parse_number<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_optional_number(get, var)?.unwrap_or(default))
}

fn parse_optional_number<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(None),
    }
}

/// Ollama server URL from `OLLAMA_HOST` / `OLLAMA_PORT`.
///
/// Accepts the `127.0.0.1:11434` form the Ollama server itself uses by
/// assuming `http://` when no scheme is given. An explicit `OLLAMA_PORT`
/// wins over a port inside the host.
fn ollama_url(host: Option<&str>, port: Option<u16>) -> Result<Url, ConfigError> {
    let host = host.unwrap_or(ollama::DEFAULT_HOST).trim();
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidUrl {
        var: "OLLAMA_HOST",
        value: host.to_string(),
        reason: e.to_string(),
    })?;
    if !url.has_host() {
        return Err(ConfigError::InvalidUrl {
            var: "OLLAMA_HOST",
            value: host.to_string(),
            reason: "no host".to_string(),
        });
    }

    let port = port.or(url.port()).unwrap_or(ollama::DEFAULT_PORT);
    url.set_port(Some(port)).map_err(|()| ConfigError::InvalidUrl {
        var: "OLLAMA_HOST",
        value: host.to_string(),
        reason: "cannot carry a port".to_string(),
    })?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_target_hosted_openai() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.provider,
            Provider::OpenAi {
                base_url: "https://api.openai.com/v1".into()
            }
        );
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.sample_rows, 3);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.connection_defaults.port, "3306");
    }

    #[test]
    fn test_ollama_provider_uses_its_own_defaults() {
        let config = config_from(&[("LLM_PROVIDER", "Ollama"), ("OLLAMA_PORT", "11500")]).unwrap();
        assert_eq!(
            config.provider,
            Provider::Ollama {
                url: Url::parse("http://localhost:11500").unwrap()
            }
        );
        assert_eq!(config.model, "llama3.2:latest");
        assert_eq!(config.provider_name(), "ollama");
    }

    fn ollama_url_of(config: &AppConfig) -> String {
        match &config.provider {
            Provider::Ollama { url } => url.to_string(),
            other => panic!("expected ollama provider, got {other:?}"),
        }
    }

    #[test]
    fn test_ollama_host_without_scheme_is_accepted() {
        let config = config_from(&[("LLM_PROVIDER", "ollama"), ("OLLAMA_HOST", "127.0.0.1")]).unwrap();
        assert_eq!(ollama_url_of(&config), "http://127.0.0.1:11434/");

        let config =
            config_from(&[("LLM_PROVIDER", "ollama"), ("OLLAMA_HOST", "127.0.0.1:11500")]).unwrap();
        assert_eq!(ollama_url_of(&config), "http://127.0.0.1:11500/");

        // Building the client must not panic on either form.
        assert_eq!(config.completion_client().model(), "llama3.2:latest");
    }

    #[test]
    fn test_explicit_ollama_port_overrides_host_port() {
        let config = config_from(&[
            ("LLM_PROVIDER", "ollama"),
            ("OLLAMA_HOST", "https://gpu-box:9000"),
            ("OLLAMA_PORT", "11434"),
        ])
        .unwrap();
        assert_eq!(ollama_url_of(&config), "https://gpu-box:11434/");
    }

    #[test]
    fn test_malformed_ollama_host_is_rejected() {
        let err = config_from(&[("LLM_PROVIDER", "ollama"), ("OLLAMA_HOST", "http://[::1")])
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "OLLAMA_HOST", .. }));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = config_from(&[("LLM_PROVIDER", "bard")]).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownProvider(p) if p == "bard"));
    }

    #[test]
    fn test_bad_max_tokens_is_rejected() {
        let err = config_from(&[("LLM_MAX_TOKENS", "many")]).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "LLM_MAX_TOKENS", .. }));
    }

    #[test]
    fn test_empty_api_key_counts_as_unset() {
        let config = config_from(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.openai_api_key.is_none());

        let config = config_from(&[("OPENAI_API_KEY", "sk-abc")]).unwrap();
        assert_eq!(config.openai_api_key.unwrap().expose_secret(), "sk-abc");
    }

    #[test]
    fn test_connection_defaults_read_mysql_vars() {
        let config = config_from(&[
            ("MYSQL_HOST", "db.internal"),
            ("MYSQL_USER", "reader"),
            ("MYSQL_PASSWORD", "s3cret"),
            ("MYSQL_DATABASE", "shop"),
        ])
        .unwrap();
        let params = config.connection_defaults;
        assert_eq!(params.host, "db.internal");
        assert_eq!(params.user, "reader");
        assert_eq!(params.password.expose_secret(), "s3cret");
        assert_eq!(params.database, "shop");
    }
}
