//! Text to fixed-length id sequence.

use crate::error::SpamError;
use crate::tokenizer::Tokenizer;

/// Default sequence length the network was trained with
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Padding id
pub const PAD_ID: u32 = 0;

/// Truncate from the end and pad at the end to exactly `max_length` ids.
pub fn pad_sequence(mut sequence: Vec<u32>, max_length: usize) -> Vec<u32> {
    sequence.truncate(max_length);
    sequence.resize(max_length, PAD_ID);
    sequence
}

/// Tokenize and pad a single message for model input.
pub fn preprocess_message(
    tokenizer: &Tokenizer,
    message: &str,
    max_length: usize,
) -> Result<Vec<u32>, SpamError> {
    if max_length == 0 {
        return Err(SpamError::Preprocess("max_length must be positive".to_string()));
    }
    let sequence = tokenizer.texts_to_sequence(message);
    Ok(pad_sequence(sequence, max_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::from_json_str(r#"{"word_index": {"free": 1, "prize": 2, "now": 3}}"#).unwrap()
    }

    #[test]
    fn test_pad_short_sequence() {
        assert_eq!(pad_sequence(vec![5, 6], 5), vec![5, 6, 0, 0, 0]);
    }

    #[test]
    fn test_truncate_keeps_leading_ids() {
        assert_eq!(pad_sequence(vec![1, 2, 3, 4, 5, 6], 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_sequence_is_all_padding() {
        assert_eq!(pad_sequence(Vec::new(), 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_preprocess_message() {
        let seq = preprocess_message(&tokenizer(), "Free prize, claim NOW", 6).unwrap();
        assert_eq!(seq, vec![1, 2, 3, 0, 0, 0]);

        let seq = preprocess_message(&tokenizer(), &"free ".repeat(250), DEFAULT_MAX_LENGTH).unwrap();
        assert_eq!(seq.len(), DEFAULT_MAX_LENGTH);
        assert!(seq.iter().all(|&id| id == 1));
    }

    #[test]
    fn test_zero_length_rejected() {
        let err = preprocess_message(&tokenizer(), "free", 0).unwrap_err();
        assert!(matches!(err, SpamError::Preprocess(_)));
    }
}
