use edbot_knowledge::{IndexError, IngestError};
use edbot_llm::LlmError;

/// Broad failure class used to pick a user-facing hint and HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Credential,
    Data,
    Network,
    Input,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Data => "data",
            Self::Network => "network",
            Self::Input => "input",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("OpenAI API key not found; set OPENAI_API_KEY")]
    MissingCredential,

    #[error("knowledge ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("knowledge index build failed: {0}")]
    Index(#[from] IndexError),

    #[error("context retrieval failed: {0}")]
    Retrieval(#[source] IndexError),

    #[error("chat request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("message is empty")]
    EmptyInput,
}

impl ChatError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential => ErrorKind::Credential,
            Self::Ingest(_) => ErrorKind::Data,
            Self::Index(IndexError::Embedding(e)) | Self::Retrieval(IndexError::Embedding(e))
                if e.is_auth() =>
            {
                ErrorKind::Credential
            }
            Self::Index(IndexError::Embedding(_)) | Self::Retrieval(IndexError::Embedding(_)) => {
                ErrorKind::Network
            }
            Self::Index(_) | Self::Retrieval(_) => ErrorKind::Data,
            Self::Llm(e) if e.is_auth() => ErrorKind::Credential,
            Self::Llm(_) => ErrorKind::Network,
            Self::EmptyInput => ErrorKind::Input,
        }
    }

    /// Short suggestion shown next to the error message.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Credential => "Check that OPENAI_API_KEY is set to a valid key.",
            ErrorKind::Data => "Check that the course and general-info CSV files exist and are well formed.",
            ErrorKind::Network => "The language model service could not be reached. Please try again.",
            ErrorKind::Input => "Type a question before sending.",
        }
    }
}
