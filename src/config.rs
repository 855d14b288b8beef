//! Layered application configuration
//!
//! Sources, later ones win: built-in defaults, an optional TOML file, then
//! `SPECSMITH__`-prefixed environment variables with `__` between keys
//! (`SPECSMITH__LLM__MODEL=gpt-4o-mini`).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use specsmith_agents::AgentOptions;
use specsmith_llm::{LlmConfig, RetryPolicy};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "specsmith.toml";

const ENV_PREFIX: &str = "SPECSMITH";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend for the architect, coder and reviewer
    pub llm: LlmConfig,
    /// Backend for the packager, JSON mode
    pub packager: LlmConfig,
    pub retry: RetryPolicy,
    pub agent: AgentOptions,
    /// Root of the dated output tree
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            packager: LlmConfig::structured_output(),
            retry: RetryPolicy::default(),
            agent: AgentOptions::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path` (required when given) or the default
    /// file (optional), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.apply_api_key_fallback(std::env::var(API_KEY_VAR).ok());
        Ok(config)
    }

    /// Fill unset API keys from `key`
    pub fn apply_api_key_fallback(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        for llm in [&mut self.llm, &mut self.packager] {
            if llm.api_key.is_none() {
                llm.api_key = Some(key.clone());
            }
        }
    }
}
