//! HTTP request/response bodies shared by spamwatchd and spamwatchctl.

use crate::config::LimitsConfig;
use crate::history::HistoryEntry;
use crate::predictor::Label;
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

impl MessageRequest {
    /// Validate and return the trimmed message.
    pub fn validate(&self, limits: &LimitsConfig) -> Result<String, ValidationIssue> {
        let cleaned = self.message.trim();
        if cleaned.is_empty() {
            return Err(ValidationIssue::body("message", "Message cannot be empty"));
        }

        let chars = cleaned.chars().count();
        if chars < limits.min_message_chars {
            return Err(ValidationIssue::body(
                "message",
                format!(
                    "Message too short (minimum {} characters required for accurate analysis)",
                    limits.min_message_chars
                ),
            ));
        }
        if chars > limits.max_message_chars {
            return Err(ValidationIssue::body(
                "message",
                format!(
                    "Message too long (maximum {} characters)",
                    limits.max_message_chars
                ),
            ));
        }

        Ok(cleaned.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMessageRequest {
    pub messages: Vec<String>,
}

impl BatchMessageRequest {
    pub fn validate(&self, limits: &LimitsConfig) -> Result<(), ValidationIssue> {
        if self.messages.is_empty() {
            return Err(ValidationIssue::body("messages", "Messages list cannot be empty"));
        }
        if self.messages.len() > limits.max_batch_size {
            return Err(ValidationIssue::body(
                "messages",
                format!("Maximum {} messages per batch", limits.max_batch_size),
            ));
        }
        Ok(())
    }

    /// Messages that are not blank, in request order.
    pub fn non_blank(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .map(String::as_str)
            .filter(|m| !m.trim().is_empty())
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Label,
    pub confidence: f64,
    pub timestamp: String,
    pub message_preview: String,
    pub processing_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub message: String,
    pub prediction: Label,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub total_processed: usize,
    pub processing_time: f64,
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePredictionResponse {
    pub filename: String,
    pub total_processed: usize,
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub total_predictions: usize,
    pub spam_count: usize,
    pub ham_count: usize,
    pub recent_predictions: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub timestamp: String,
    /// Seconds since the daemon started
    #[serde(default)]
    pub uptime_seconds: u64,
}

/// Acknowledgement for management actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    /// Serialized as an object whose keys keep declaration order
    #[serde(with = "ordered_pairs")]
    pub endpoints: Vec<(String, String)>,
}

mod ordered_pairs {
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(pairs.iter().map(|(k, v)| (k, v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, String)>, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, String>()? {
                    pairs.push(pair);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    /// Issue located at a request body field.
    pub fn body(field: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: "value_error".to_string(),
        }
    }

    /// Body that could not be parsed at all.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string()],
            msg: msg.into(),
            kind: "json_invalid".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Issues(Vec<ValidationIssue>),
}

impl ErrorDetail {
    /// The first human-readable message.
    pub fn first_message(&self) -> Option<&str> {
        match self {
            ErrorDetail::Message(m) => Some(m),
            ErrorDetail::Issues(issues) => issues.first().map(|i| i.msg.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}
