//! Configuration system (layered: defaults < config file < env < CLI flags).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EdaError, Result};

pub const DEFAULT_EDA_MODEL: &str = "qwen/qwen3-235b-a22b-instruct-2507";
pub const DEFAULT_BROWSER_MODEL: &str = "google/gemma-3-27b-it";
pub const DEFAULT_MAX_CONSECUTIVE_TOOL_CALLS: usize = 12;
pub const DEFAULT_SANDBOX_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 300;

/// Resolved settings for one run of the program.
///
/// A single API key serves both the chat model and the sandbox provider,
/// matching how the hosted endpoints are provisioned.
#[derive(Clone, PartialEq)]
pub struct EdaConfig {
    pub api_key: Option<String>,
    pub model_base_url: Option<String>,
    pub eda_model: String,
    pub browser_model: String,
    pub sandbox_domain: Option<String>,
    pub sandbox_template: Option<String>,
    pub sandbox_timeout_secs: u64,
    pub execution_timeout_secs: u64,
    pub max_consecutive_tool_calls: usize,
    pub download_dir: PathBuf,
    pub default_dataset: PathBuf,
    pub image_dir: PathBuf,
    pub browser_agent_command: Option<Vec<String>>,
}

impl std::fmt::Debug for EdaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdaConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model_base_url", &self.model_base_url)
            .field("eda_model", &self.eda_model)
            .field("browser_model", &self.browser_model)
            .field("sandbox_domain", &self.sandbox_domain)
            .field("sandbox_template", &self.sandbox_template)
            .field("sandbox_timeout_secs", &self.sandbox_timeout_secs)
            .field("execution_timeout_secs", &self.execution_timeout_secs)
            .field("max_consecutive_tool_calls", &self.max_consecutive_tool_calls)
            .field("download_dir", &self.download_dir)
            .field("default_dataset", &self.default_dataset)
            .field("image_dir", &self.image_dir)
            .field("browser_agent_command", &self.browser_agent_command)
            .finish()
    }
}

impl Default for EdaConfig {
    fn default() -> Self {
        let download_dir = PathBuf::from("./Download");
        Self {
            api_key: None,
            model_base_url: None,
            eda_model: DEFAULT_EDA_MODEL.to_string(),
            browser_model: DEFAULT_BROWSER_MODEL.to_string(),
            sandbox_domain: None,
            sandbox_template: None,
            sandbox_timeout_secs: DEFAULT_SANDBOX_TIMEOUT_SECS,
            execution_timeout_secs: DEFAULT_EXECUTION_TIMEOUT_SECS,
            max_consecutive_tool_calls: DEFAULT_MAX_CONSECUTIVE_TOOL_CALLS,
            default_dataset: download_dir.join("data.csv"),
            download_dir,
            image_dir: PathBuf::from("."),
            browser_agent_command: None,
        }
    }
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    api_key: Option<String>,
    model_base_url: Option<String>,
    eda_model: Option<String>,
    browser_model: Option<String>,
    sandbox_domain: Option<String>,
    sandbox_template: Option<String>,
    sandbox_timeout_secs: Option<u64>,
    execution_timeout_secs: Option<u64>,
    max_consecutive_tool_calls: Option<usize>,
    download_dir: Option<PathBuf>,
    default_dataset: Option<PathBuf>,
    image_dir: Option<PathBuf>,
    browser_agent_command: Option<Vec<String>>,
}

impl EdaConfig {
    /// Load defaults, then the config file, then `.env` and the environment.
    ///
    /// An explicit `file` must exist; the platform default path is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = match file {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };
        if let Some(path) = path {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                EdaError::Configuration(format!("cannot read {}: {e}", path.display()))
            })?;
            config.apply_toml(&text)?;
            tracing::debug!(path = %path.display(), "loaded config file");
        }

        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay settings from TOML text.
    pub fn apply_toml(&mut self, text: &str) -> Result<()> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| EdaError::Configuration(e.to_string()))?;

        overlay(&mut self.api_key, file.api_key);
        overlay(&mut self.model_base_url, file.model_base_url);
        overlay(&mut self.sandbox_domain, file.sandbox_domain);
        overlay(&mut self.sandbox_template, file.sandbox_template);
        overlay(&mut self.browser_agent_command, file.browser_agent_command);
        if let Some(v) = file.eda_model {
            self.eda_model = v;
        }
        if let Some(v) = file.browser_model {
            self.browser_model = v;
        }
        if let Some(v) = file.sandbox_timeout_secs {
            self.sandbox_timeout_secs = v;
        }
        if let Some(v) = file.execution_timeout_secs {
            self.execution_timeout_secs = v;
        }
        if let Some(v) = file.max_consecutive_tool_calls {
            self.max_consecutive_tool_calls = v;
        }
        if let Some(v) = file.download_dir {
            self.download_dir = v;
        }
        if let Some(v) = file.default_dataset {
            self.default_dataset = v;
        }
        if let Some(v) = file.image_dir {
            self.image_dir = v;
        }
        Ok(())
    }

    /// Overlay settings from environment variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        };

        overlay(&mut self.api_key, get(&["NOVITA_API_KEY", "OPENAI_API_KEY"]));
        overlay(
            &mut self.model_base_url,
            get(&["NOVITA_BASE_URL", "OPENAI_BASE_URL"]),
        );
        overlay(&mut self.sandbox_domain, get(&["NOVITA_E2B_DOMAIN", "E2B_DOMAIN"]));
        overlay(&mut self.sandbox_template, get(&["NOVITA_E2B_TEMPLATE"]));
        if let Some(v) = get(&["EDA_MODEL"]) {
            self.eda_model = v;
        }
        if let Some(v) = get(&["EDA_BROWSER_MODEL"]) {
            self.browser_model = v;
        }
        if let Some(v) = get(&["EDA_MAX_TOOL_CALLS"]) {
            self.max_consecutive_tool_calls = parse_number("EDA_MAX_TOOL_CALLS", &v)?;
        }
        if let Some(v) = get(&["EDA_SANDBOX_TIMEOUT_SECS"]) {
            self.sandbox_timeout_secs = parse_number("EDA_SANDBOX_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get(&["EDA_DOWNLOAD_DIR"]) {
            self.download_dir = PathBuf::from(v);
        }
        if let Some(v) = get(&["EDA_IMAGE_DIR"]) {
            self.image_dir = PathBuf::from(v);
        }
        if let Some(v) = get(&["EDA_BROWSER_AGENT_COMMAND"]) {
            self.browser_agent_command = Some(v.split_whitespace().map(str::to_string).collect());
        }
        Ok(())
    }

    /// Check that everything an EDA session needs is present.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(EdaError::Configuration("Missing NOVITA_API_KEY".into()));
        }
        if self.model_base_url.is_none() {
            return Err(EdaError::Configuration("Missing NOVITA_BASE_URL".into()));
        }
        if self.sandbox_domain.is_none() {
            return Err(EdaError::Configuration("Missing NOVITA_E2B_DOMAIN".into()));
        }
        if self.max_consecutive_tool_calls == 0 {
            return Err(EdaError::Configuration(
                "max_consecutive_tool_calls must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| EdaError::Configuration(format!("{key} must be a number, got '{value}'")))
}

/// Platform config file location (e.g. `~/.config/agentic-eda/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agentic-eda")
        .map(|dirs| dirs.config_dir().join("config.toml"))
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
    fn defaults_match_documented_values() {
        let config = EdaConfig::default();
        assert_eq!(config.max_consecutive_tool_calls, 12);
        assert_eq!(config.sandbox_timeout_secs, 600);
        assert_eq!(config.default_dataset, PathBuf::from("./Download/data.csv"));
        assert_eq!(config.eda_model, DEFAULT_EDA_MODEL);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = EdaConfig::default();
        config
            .apply_toml("eda_model = \"file-model\"\nmax_consecutive_tool_calls = 4\n")
            .unwrap();
        config
            .apply_env(env(&[("EDA_MODEL", "env-model"), ("NOVITA_API_KEY", "k")]))
            .unwrap();
        assert_eq!(config.eda_model, "env-model");
        assert_eq!(config.max_consecutive_tool_calls, 4);
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn openai_key_is_a_fallback_only() {
        let mut config = EdaConfig::default();
        config
            .apply_env(env(&[("OPENAI_API_KEY", "openai"), ("NOVITA_API_KEY", "novita")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("novita"));
    }

    #[test]
    fn invalid_number_in_env_is_a_configuration_error() {
        let mut config = EdaConfig::default();
        let err = config
            .apply_env(env(&[("EDA_MAX_TOOL_CALLS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, EdaError::Configuration(msg) if msg.contains("EDA_MAX_TOOL_CALLS")));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut config = EdaConfig::default();
        assert!(config.apply_toml("not_a_key = 1").is_err());
    }

    #[test]
    fn validate_reports_missing_sandbox_domain() {
        let mut config = EdaConfig::default();
        config
            .apply_env(env(&[("NOVITA_API_KEY", "k"), ("NOVITA_BASE_URL", "http://x")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("NOVITA_E2B_DOMAIN"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = EdaConfig {
            api_key: Some("secret-key".into()),
            ..EdaConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
