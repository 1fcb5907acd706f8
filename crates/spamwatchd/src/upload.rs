//! Message extraction from uploaded files.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// Header row, then one message per row in the first column
    Csv,
    /// One message per non-blank line
    Txt,
}

impl UploadFormat {
    /// Format from the file extension, if supported.
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(UploadFormat::Csv),
            "txt" => Some(UploadFormat::Txt),
            _ => None,
        }
    }
}

/// Extract messages from file content. Blank messages are skipped.
///
/// CSV rows must have as many fields as the header row.
pub fn parse_messages(format: UploadFormat, text: &str) -> Result<Vec<String>, csv::Error> {
    match format {
        UploadFormat::Txt => Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        UploadFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_reader(text.as_bytes());

            let mut messages = Vec::new();
            for record in reader.records() {
                let record = record?;
                if let Some(first) = record.get(0) {
                    if !first.trim().is_empty() {
                        messages.push(first.to_string());
                    }
                }
            }
            Ok(messages)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(UploadFormat::from_filename("inbox.csv"), Some(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_filename("inbox.TXT"), Some(UploadFormat::Txt));
        assert_eq!(UploadFormat::from_filename("inbox.json"), None);
        assert_eq!(UploadFormat::from_filename("csv"), None);
        assert_eq!(UploadFormat::from_filename(""), None);
    }

    #[test]
    fn test_txt_lines() {
        let text = "  first message  \n\n\t\nsecond message\r\nthird";
        assert_eq!(
            parse_messages(UploadFormat::Txt, text).unwrap(),
            vec!["first message", "second message", "third"]
        );
    }

    #[test]
    fn test_csv_skips_header_and_takes_first_column() {
        let text = "message,label\n\"Win a prize, now\",spam\nSee you at five,ham\n,ham\n";
        assert_eq!(
            parse_messages(UploadFormat::Csv, text).unwrap(),
            vec!["Win a prize, now", "See you at five"]
        );
    }

    #[test]
    fn test_csv_ragged_row_rejected() {
        let text = "message,label\nSee you at five,ham\nlonely\n";
        assert!(parse_messages(UploadFormat::Csv, text).is_err());
    }

    #[test]
    fn test_csv_header_only() {
        assert!(parse_messages(UploadFormat::Csv, "message\n").unwrap().is_empty());
        assert!(parse_messages(UploadFormat::Csv, "").unwrap().is_empty());
    }
}
