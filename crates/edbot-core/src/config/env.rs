use std::str::FromStr;

use super::Config;

/// Read and parse `name`; a set but unparsable value is ignored with a warning.
pub(crate) fn parsed_env<T: FromStr>(name: &str) -> Option<T> {
    let v = std::env::var(name).ok()?;
    let parsed = v.parse().ok();
    if parsed.is_none() {
        tracing::warn!("ignoring invalid {name} value: {v}");
    }
    parsed
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("EDBOT_VARIANT") {
            match v.parse() {
                Ok(variant) => self.bot.variant = variant,
                Err(e) => tracing::warn!("ignoring invalid EDBOT_VARIANT value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("EDBOT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("EDBOT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("EDBOT_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(t) = parsed_env::<f32>("EDBOT_LLM_TEMPERATURE") {
            self.llm.temperature = t;
        }
        if let Ok(v) = std::env::var("EDBOT_COURSES_PATH") {
            self.knowledge.courses_path = v.into();
        }
        if let Ok(v) = std::env::var("EDBOT_INFO_PATH") {
            self.knowledge.info_path = v.into();
        }
        if let Some(k) = parsed_env::<usize>("EDBOT_TOP_K") {
            self.knowledge.top_k = k;
        }
        if let Ok(v) = std::env::var("EDBOT_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed_env::<u16>("EDBOT_GATEWAY_PORT") {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("EDBOT_GATEWAY_TOKEN") {
            self.gateway.auth_token = Some(v);
        }
    }
}
