use thiserror::Error;

/// Failure kinds of one summarize request
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Unparseable URL, missing API key, unknown style or malformed request body
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every transcript language attempt failed
    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    /// The LLM call itself failed (network, auth, quota)
    #[error("script generation failed: {0}")]
    Generation(String),

    /// The LLM replied but not with the expected JSON object
    #[error("failed to parse model response: {reason}\nresponse content: {content}")]
    MalformedResponse { reason: String, content: String },
}

impl ScriptError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScriptError::InvalidInput(_))
    }
}
