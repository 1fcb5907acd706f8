//! Bounded in-memory prediction log.
//!
//! Oldest entries are evicted first once capacity is exceeded. Nothing is
//! persisted; a restart starts from an empty log.

use crate::predictor::{preview, Label, Prediction};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 100;

/// Characters of the message kept in a history entry
pub const HISTORY_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub message: String,
    pub prediction: Label,
    pub confidence: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct PredictionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PredictionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a prediction, evicting the oldest entry when full.
    pub fn record(&mut self, message: &str, prediction: &Prediction, timestamp: String) {
        self.entries.push_back(HistoryEntry {
            message: preview(message, HISTORY_PREVIEW_CHARS),
            prediction: prediction.label,
            confidence: prediction.confidence,
            timestamp,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (spam, ham) counts over the retained entries
    pub fn counts(&self) -> (usize, usize) {
        let spam = self
            .entries
            .iter()
            .filter(|e| e.prediction == Label::Spam)
            .count();
        (spam, self.entries.len() - spam)
    }

    /// Last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}
