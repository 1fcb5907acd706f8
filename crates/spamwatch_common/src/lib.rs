//! Shared types and inference pipeline for Spamwatch.
//!
//! The daemon and the control CLI both depend on this crate: the daemon for
//! the tokenizer, model and history, the CLI for the wire schemas.

pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod predictor;
pub mod preprocess;
pub mod schemas;
pub mod tokenizer;

pub use config::SpamwatchConfig;
pub use error::SpamError;
pub use history::{HistoryEntry, PredictionHistory};
pub use model::{Classifier, CnnModel, ModelBundle};
pub use predictor::{predict_spam, preview, Label, Prediction};
pub use tokenizer::Tokenizer;

/// Version string reported by `/` and the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local ISO-8601 timestamp with microsecond precision and no offset.
pub fn now_iso() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
