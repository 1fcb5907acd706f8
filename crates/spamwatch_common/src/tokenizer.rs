//! Word-index tokenizer.
//!
//! Reads the JSON document written by a Keras `Tokenizer.to_json()` and
//! reproduces its `texts_to_sequences` behavior for a single text, so the
//! daemon feeds the network exactly the ids it was trained on.

use crate::error::SpamError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Keras default filter set
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// `word_index` is stored either as an object or as a JSON string holding one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordIndexField {
    Map(HashMap<String, u32>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
struct TokenizerJsonConfig {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    word_index: WordIndexField,
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_lower() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenizerDocument {
    Wrapped { config: TokenizerJsonConfig },
    Bare(TokenizerJsonConfig),
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    word_index: HashMap<String, u32>,
    num_words: Option<usize>,
    oov_index: Option<u32>,
    lower: bool,
    filters: String,
    split: String,
    char_level: bool,
}

impl Tokenizer {
    /// Parse a tokenizer document.
    pub fn from_json_str(json: &str) -> Result<Self, SpamError> {
        let doc: TokenizerDocument = serde_json::from_str(json)
            .map_err(|e| SpamError::TokenizerLoad(format!("invalid tokenizer JSON: {}", e)))?;
        let config = match doc {
            TokenizerDocument::Wrapped { config } => config,
            TokenizerDocument::Bare(config) => config,
        };

        let word_index = match config.word_index {
            WordIndexField::Map(map) => map,
            WordIndexField::Encoded(raw) => serde_json::from_str(&raw).map_err(|e| {
                SpamError::TokenizerLoad(format!("invalid encoded word_index: {}", e))
            })?,
        };
        if word_index.is_empty() {
            return Err(SpamError::TokenizerLoad("word_index is empty".to_string()));
        }
        if config.split.is_empty() && !config.char_level {
            return Err(SpamError::TokenizerLoad("split separator is empty".to_string()));
        }

        // An OOV token absent from word_index behaves as no OOV token at all
        let oov_index = config
            .oov_token
            .as_ref()
            .and_then(|token| word_index.get(token).copied());

        Ok(Self {
            word_index,
            num_words: config.num_words,
            oov_index,
            lower: config.lower,
            filters: config.filters,
            split: config.split,
            char_level: config.char_level,
        })
    }

    /// Load a tokenizer document from disk.
    pub fn load(path: &Path) -> Result<Self, SpamError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SpamError::TokenizerLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Number of known words (OOV token included).
    pub fn vocabulary_size(&self) -> usize {
        self.word_index.len()
    }

    /// Split text into the units looked up in the word index.
    pub fn text_to_words(&self, text: &str) -> Vec<String> {
        let text = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if self.char_level {
            return text.chars().map(String::from).collect();
        }

        let mut translated = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(c) {
                translated.push_str(&self.split);
            } else {
                translated.push(c);
            }
        }

        translated
            .split(self.split.as_str())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Map text to token ids.
    pub fn texts_to_sequence(&self, text: &str) -> Vec<u32> {
        self.text_to_words(text)
            .iter()
            .filter_map(|word| match self.word_index.get(word) {
                Some(&index) => match self.num_words {
                    Some(limit) if limit > 0 && index as usize >= limit => self.oov_index,
                    _ => Some(index),
                },
                None => self.oov_index,
            })
            .collect()
    }
}
