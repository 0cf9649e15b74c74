#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} rejected the API key (status {status})")]
    Unauthorized { provider: String, status: u16 },

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} API request failed (status {status})")]
    Status { provider: String, status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding count mismatch: sent {expected} input(s), received {actual}")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether the failure points at a missing or rejected credential.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_auth() {
        let err = LlmError::Unauthorized {
            provider: "openai".into(),
            status: 401,
        };
        assert!(err.is_auth());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn status_is_not_auth() {
        let err = LlmError::Status {
            provider: "openai".into(),
            status: 500,
        };
        assert!(!err.is_auth());
        assert_eq!(err.to_string(), "openai API request failed (status 500)");
    }
}
