use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::signature::SignaturePolicy;

/// Optional config file read from the working directory.
pub const CONFIG_FILE: &str = ".pr-assistant.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("GitHub token not configured. Set GITHUB_TOKEN or [github].token")]
    MissingGitHubToken,

    #[error(
        "Webhook secret not configured. Set GITHUB_WEBHOOK_SECRET, \
         or ALLOW_UNSIGNED_WEBHOOKS=true for local development"
    )]
    MissingWebhookSecret,
}

/// Top-level configuration.
///
/// Every section is optional in the TOML file; environment variables
/// override file values when set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub ai: AiConfig,
    pub server: ServerConfig,
    pub fix: FixConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Token used for comments, labels, diffs and fix PRs
    pub token: Option<String>,
    /// Shared secret for `X-Hub-Signature-256`
    pub webhook_secret: Option<String>,
    /// REST API root, overridable for GitHub Enterprise
    pub api_base: String,
    /// Label added to every handled issue and pull request
    pub default_label: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            webhook_secret: None,
            api_base: "https://api.github.com".to_string(),
            default_label: "ai-reviewed".to_string(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Full URL of the chat completions endpoint
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_ms: 30_000,
            max_tokens: 800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Accept unsigned deliveries when no webhook secret is set
    pub allow_unsigned: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            allow_unsigned: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Commit AI-authored patches to a new branch and open a PR.
    /// There is no human review step before the branch is written.
    pub auto_apply: bool,
}

impl Config {
    /// Load configuration from .pr-assistant.toml in the current directory,
    /// then apply environment overrides. Returns defaults when the file
    /// doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a specific path without environment overrides.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Override fields from environment variables. `lookup` returns the
    /// value of a variable, or `None` when unset.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = get("GITHUB_WEBHOOK_SECRET") {
            self.github.webhook_secret = Some(v);
        }
        if let Some(v) = get("GITHUB_API_BASE") {
            self.github.api_base = v;
        }
        if let Some(v) = get("DEFAULT_LABEL") {
            self.github.default_label = v;
        }
        if let Some(v) = get("MODEL_API") {
            self.ai.endpoint = Some(v);
        }
        if let Some(v) = get("MODEL_API_KEY") {
            self.ai.api_key = Some(v);
        }
        if let Some(v) = get("MODEL_NAME") {
            self.ai.model = v;
        }
        if let Some(v) = get("MODEL_TIMEOUT_MS") {
            self.ai.timeout_ms = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "MODEL_TIMEOUT_MS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("AUTO_APPLY_FIX") {
            self.fix.auto_apply = v.trim() == "true";
        }
        if let Some(v) = get("ALLOW_UNSIGNED_WEBHOOKS") {
            self.server.allow_unsigned = v.trim() == "true";
        }
        if let Some(v) = get("BIND_ADDR") {
            self.server.bind = v;
        }
        Ok(())
    }

    /// The GitHub token, required to run the server.
    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingGitHubToken)
    }

    /// Resolve how webhook signatures are checked.
    ///
    /// A missing secret is fatal unless `server.allow_unsigned` opts into
    /// the development bypass.
    pub fn signature_policy(&self) -> Result<SignaturePolicy, ConfigError> {
        match self.github.webhook_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Ok(SignaturePolicy::Enforce(secret.as_bytes().to_vec()))
            }
            _ if self.server.allow_unsigned => {
                warn!("no webhook secret configured; accepting unsigned deliveries");
                Ok(SignaturePolicy::Bypass)
            }
            _ => Err(ConfigError::MissingWebhookSecret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.github.default_label, "ai-reviewed");
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.timeout_ms, 30_000);
        assert_eq!(config.ai.max_tokens, 800);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert!(!config.fix.auto_apply);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
default_label = "bot"

[ai]
endpoint = "https://llm.example/v1/chat/completions"
model = "deepseek-chat"

[fix]
auto_apply = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github.default_label, "bot");
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.ai.model, "deepseek-chat");
        assert_eq!(config.ai.timeout_ms, 30_000);
        assert!(config.fix.auto_apply);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("pr_assistant_test_config.toml");
        std::fs::write(&path, "[server]\nbind = \"127.0.0.1:9000\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: Config = toml::from_str("[ai]\nmodel = \"from-file\"\n").unwrap();
        config
            .apply_env(env(&[
                ("GITHUB_TOKEN", "ghp_test"),
                ("MODEL_NAME", "from-env"),
                ("MODEL_API", "http://localhost/v1"),
                ("AUTO_APPLY_FIX", "true"),
                ("DEFAULT_LABEL", "triaged"),
                ("MODEL_TIMEOUT_MS", "5000"),
            ]))
            .unwrap();
        assert_eq!(config.github_token().unwrap(), "ghp_test");
        assert_eq!(config.ai.model, "from-env");
        assert_eq!(config.ai.endpoint.as_deref(), Some("http://localhost/v1"));
        assert!(config.fix.auto_apply);
        assert_eq!(config.github.default_label, "triaged");
        assert_eq!(config.ai.timeout_ms, 5000);
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("MODEL_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "MODEL_TIMEOUT_MS", .. }));
    }

    #[test]
    fn test_auto_apply_requires_literal_true() {
        let mut config = Config::default();
        config.apply_env(env(&[("AUTO_APPLY_FIX", "yes")])).unwrap();
        assert!(!config.fix.auto_apply);
    }

    #[test]
    fn test_missing_token_is_error() {
        let config = Config::default();
        assert!(matches!(config.github_token(), Err(ConfigError::MissingGitHubToken)));
    }

    #[test]
    fn test_missing_secret_is_fatal_by_default() {
        let config = Config::default();
        assert!(matches!(
            config.signature_policy(),
            Err(ConfigError::MissingWebhookSecret)
        ));
    }

    #[test]
    fn test_missing_secret_allowed_in_dev_mode() {
        let mut config = Config::default();
        config.apply_env(env(&[("ALLOW_UNSIGNED_WEBHOOKS", "true")])).unwrap();
        assert!(matches!(config.signature_policy(), Ok(SignaturePolicy::Bypass)));
    }

    #[test]
    fn test_secret_yields_enforcing_policy() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("GITHUB_WEBHOOK_SECRET", "s3cret"),
                ("ALLOW_UNSIGNED_WEBHOOKS", "true"),
            ]))
            .unwrap();
        match config.signature_policy().unwrap() {
            SignaturePolicy::Enforce(secret) => assert_eq!(secret, b"s3cret"),
            SignaturePolicy::Bypass => panic!("secret was configured"),
        }
    }
}
