use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

/// Top-level configuration for EdBot.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Which chat pipeline a deployment runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// User turn straight to the model, no instruction block.
    Plain,
    /// Fixed persona instruction before every call.
    Persona,
    /// Persona plus retrieved knowledge-base context.
    #[default]
    Retrieval,
}

impl Variant {
    #[must_use]
    pub fn has_persona(self) -> bool {
        !matches!(self, Self::Plain)
    }

    #[must_use]
    pub fn uses_retrieval(self) -> bool {
        matches!(self, Self::Retrieval)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Persona => "persona",
            Self::Retrieval => "retrieval",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "persona" => Ok(Self::Persona),
            "retrieval" | "rag" => Ok(Self::Retrieval),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

fn default_bot_name() -> String {
    "EdBot".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default)]
    pub variant: Variant,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            variant: Variant::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
        }
    }
}

fn default_courses_path() -> PathBuf {
    PathBuf::from("data/courses.csv")
}

fn default_info_path() -> PathBuf {
    PathBuf::from("data/general_info.csv")
}

fn default_top_k() -> usize {
    edbot_knowledge::DEFAULT_TOP_K
}

fn default_embed_batch_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_courses_path")]
    pub courses_path: PathBuf,
    #[serde(default = "default_info_path")]
    pub info_path: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            courses_path: default_courses_path(),
            info_path: default_info_path(),
            top_k: default_top_k(),
            embed_batch_size: default_embed_batch_size(),
        }
    }
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8501
}

fn default_gateway_rate_limit() -> u32 {
    60
}

fn default_gateway_max_body() -> usize {
    65_536
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_gateway_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            auth_token: None,
            rate_limit: default_gateway_rate_limit(),
            max_body_size: default_gateway_max_body(),
        }
    }
}

/// Credentials resolved from the environment, never read from the file.
#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub openai_api_key: Option<Secret>,
}
