//! Error types for the inference pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Tokenizer load error: {0}")]
    TokenizerLoad(String),

    #[error("Preprocessing error: {0}")]
    Preprocess(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SpamError::Inference("token 42 out of range".into());
        assert_eq!(err.to_string(), "Inference error: token 42 out of range");
    }
}
