//! Single-message inference: preprocess, forward pass, label.

use crate::error::SpamError;
use crate::model::ModelBundle;
use crate::preprocess::preprocess_message;
use crate::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::Ham => "ham",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    /// Confidence in the chosen label, percent with 2 decimals
    pub confidence: f64,
}

impl Prediction {
    /// Label and confidence from a raw spam probability.
    pub fn from_probability(prob: f32, threshold: f32) -> Self {
        let is_spam = prob > threshold;
        let prob = f64::from(prob);
        let conf = if is_spam { prob } else { 1.0 - prob };
        Self {
            label: if is_spam { Label::Spam } else { Label::Ham },
            confidence: round_to(conf * 100.0, 2),
        }
    }
}

/// Run inference on one message.
pub fn predict_spam(
    bundle: &ModelBundle,
    message: &str,
    max_length: usize,
    threshold: f32,
) -> Result<Prediction, SpamError> {
    let sequence = preprocess_message(&bundle.tokenizer, message, max_length).map_err(|e| {
        error!("Preprocessing failed: {}", e);
        e
    })?;

    let prob = bundle.classifier.spam_probability(&sequence).map_err(|e| {
        error!("Prediction failed: {}", e);
        match e {
            SpamError::Inference(_) => e,
            other => SpamError::Inference(other.to_string()),
        }
    })?;

    Ok(Prediction::from_probability(prob, threshold))
}

/// First `limit` characters, with "..." appended when the message is longer.
pub fn preview(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::tiny_artifact;
    use crate::model::{Classifier, CnnModel};
    use crate::tokenizer::Tokenizer;
    use std::sync::Arc;

    struct FixedClassifier(f32);

    impl Classifier for FixedClassifier {
        fn spam_probability(&self, _sequence: &[u32]) -> Result<f32, SpamError> {
            Ok(self.0)
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn spam_probability(&self, _sequence: &[u32]) -> Result<f32, SpamError> {
            Err(SpamError::Io(std::io::Error::other("device lost")))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn tokenizer() -> Tokenizer {
        Tokenizer::from_json_str(r#"{"word_index": {"free": 1, "hello": 2, "maybe": 3}}"#).unwrap()
    }

    #[test]
    fn test_from_probability() {
        let p = Prediction::from_probability(0.9, 0.5);
        assert_eq!(p.label, Label::Spam);
        assert_eq!(p.confidence, 90.0);

        let p = Prediction::from_probability(0.125, 0.5);
        assert_eq!(p.label, Label::Ham);
        assert_eq!(p.confidence, 87.5);

        // Exactly at the threshold is ham
        let p = Prediction::from_probability(0.5, 0.5);
        assert_eq!(p.label, Label::Ham);
        assert_eq!(p.confidence, 50.0);
    }

    #[test]
    fn test_predict_with_cnn() {
        let bundle = ModelBundle::new(
            Arc::new(CnnModel::from_artifact(tiny_artifact()).unwrap()),
            tokenizer(),
        );
        let spam = predict_spam(&bundle, "FREE free stuff", 10, 0.5).unwrap();
        assert_eq!(spam.label, Label::Spam);
        assert!(spam.confidence > 90.0);

        let ham = predict_spam(&bundle, "hello hello there", 10, 0.5).unwrap();
        assert_eq!(ham.label, Label::Ham);
    }

    #[test]
    fn test_classifier_failure_is_inference_error() {
        let bundle = ModelBundle::new(Arc::new(BrokenClassifier), tokenizer());
        let err = predict_spam(&bundle, "hello world", 10, 0.5).unwrap_err();
        assert!(matches!(err, SpamError::Inference(_)));
    }

    #[test]
    fn test_preprocess_failure_is_preprocess_error() {
        let bundle = ModelBundle::new(Arc::new(FixedClassifier(0.2)), tokenizer());
        let err = predict_spam(&bundle, "hello world", 0, 0.5).unwrap_err();
        assert!(matches!(err, SpamError::Preprocess(_)));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview(&"a".repeat(50), 50), "a".repeat(50));
        assert_eq!(preview(&"a".repeat(51), 50), format!("{}...", "a".repeat(50)));
        // Multi-byte characters are counted, not bytes
        assert_eq!(preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_string(&Label::Spam).unwrap(), "\"spam\"");
        assert_eq!(Label::Ham.to_string(), "ham");
    }
}
