mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::secret::Secret;

/// Environment variables holding the OpenAI API key, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["EDBOT_OPENAI_API_KEY", "OPENAI_API_KEY"];

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the API key from the process environment.
    pub fn resolve_secrets(&mut self) {
        self.resolve_secrets_with(|key| std::env::var(key).ok());
    }

    /// Resolve the API key through `lookup`; blank values count as unset.
    pub fn resolve_secrets_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.secrets.openai_api_key = API_KEY_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|v| !v.trim().is_empty())
            .map(Secret::new);
    }

    /// The resolved API key, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&Secret> {
        self.secrets.openai_api_key.as_ref()
    }

    /// Check value ranges that deserialization cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.llm.embedding_model.trim().is_empty() {
            bail!("llm.embedding_model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            );
        }
        if self.knowledge.top_k == 0 {
            bail!("knowledge.top_k must be at least 1");
        }
        if self.knowledge.embed_batch_size == 0 {
            bail!("knowledge.embed_batch_size must be at least 1");
        }
        Ok(())
    }
}
