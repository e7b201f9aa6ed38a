//! Pre- and post-condition checks around the summarisation step.

use crate::summary::SummaryOptions;
use thiserror::Error;

/// Minimum trimmed length of an input text, in characters
pub const MIN_INPUT_CHARS: usize = 15;
/// Maximum length of an input text, in characters
pub const MAX_INPUT_CHARS: usize = 10_000;
/// Minimum number of words a summary must contain
pub const MIN_SUMMARY_WORDS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidOutput(String),
}

/// Check the caller's text before any processing
pub fn validate_input(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInput(
            "O texto de entrada está vazio.".to_string(),
        ));
    }

    if trimmed.chars().count() < MIN_INPUT_CHARS {
        return Err(ValidationError::InvalidInput(format!(
            "O texto deve conter pelo menos {} caracteres.",
            MIN_INPUT_CHARS
        )));
    }

    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(ValidationError::InvalidInput(format!(
            "O texto deve conter no máximo {} caracteres.",
            MAX_INPUT_CHARS
        )));
    }

    Ok(())
}

/// Check the per-request options
pub fn validate_options(options: &SummaryOptions) -> Result<(), ValidationError> {
    if !(100..=2000).contains(&options.max_length) {
        return Err(ValidationError::InvalidInput(
            "max_length deve estar entre 100 e 2000.".to_string(),
        ));
    }
    Ok(())
}

/// Check a generated summary before it is stored
pub fn validate_output(summary: &str) -> Result<(), ValidationError> {
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidOutput(
            "O resumo gerado está vazio.".to_string(),
        ));
    }

    if trimmed.split_whitespace().count() < MIN_SUMMARY_WORDS {
        return Err(ValidationError::InvalidOutput(
            "O resumo está muito curto e pode estar incorreto.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_input() {
        assert!(validate_input("Texto válido para análise.").is_ok());
    }

    #[test]
    fn rejects_empty_and_blank_input() {
        for text in ["", "   ", "\n\t  \n"] {
            assert!(matches!(
                validate_input(text),
                Err(ValidationError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn rejects_short_input_after_trimming() {
        // 14 characters padded with whitespace
        let text = "     abcdefghijklmn     ";
        assert!(matches!(
            validate_input(text),
            Err(ValidationError::InvalidInput(_))
        ));
        assert!(validate_input("abcdefghijklmno").is_ok());
    }

    #[test]
    fn short_input_is_counted_in_characters() {
        // 14 multi-byte characters, well over 15 bytes
        assert!(validate_input("éééééééééééééé").is_err());
        assert!(validate_input("ééééééééééééééé").is_ok());
    }

    #[test]
    fn rejects_oversized_input() {
        let text = "a".repeat(MAX_INPUT_CHARS + 1);
        assert!(validate_input(&text).is_err());
        assert!(validate_input(&"a".repeat(MAX_INPUT_CHARS)).is_ok());
    }

    #[test]
    fn checks_max_length_range() {
        let mut options = SummaryOptions::default();
        assert!(validate_options(&options).is_ok());
        options.max_length = 99;
        assert!(validate_options(&options).is_err());
        options.max_length = 2000;
        assert!(validate_options(&options).is_ok());
        options.max_length = 2001;
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn accepts_summary_with_three_words() {
        assert!(validate_output("Resumo bem simples.").is_ok());
    }

    #[test]
    fn rejects_empty_or_short_summary() {
        for summary in ["", "   ", "Resumo simples.", "  uma  palavra  "] {
            assert!(matches!(
                validate_output(summary),
                Err(ValidationError::InvalidOutput(_))
            ));
        }
    }
}
