//! Summary types - requests, results and processing metadata.
//!
//! Field names on the wire follow the public API (`texto`, `resumo`, ...),
//! while the Rust side uses English names.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default advisory length for a summary, in characters
pub const DEFAULT_MAX_LENGTH: u32 = 500;

/// Target language of the generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Language {
    /// Human-readable name used inside the prompt
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Language::PtBr => "Brazilian Portuguese",
            Language::EnUs => "American English",
        }
    }
}

/// Education level of the intended reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Fundamental,
    #[default]
    Medio,
    Superior,
}

impl EducationLevel {
    pub fn audience(&self) -> &'static str {
        match self {
            EducationLevel::Fundamental => "primary school students",
            EducationLevel::Medio => "high school students",
            EducationLevel::Superior => "university students",
        }
    }
}

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

/// Optional per-request settings.
///
/// `max_length` is accepted and range-checked but only advisory: the
/// processor always applies its own hard cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryOptions {
    /// Preferred summary size in characters (100 to 2000)
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Summary language (pt-BR or en-US)
    #[serde(default)]
    pub language: Language,
    /// Reader's education level (fundamental, medio, superior)
    #[serde(default, rename = "nivel_ensino")]
    pub education_level: EducationLevel,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            language: Language::default(),
            education_level: EducationLevel::default(),
        }
    }
}

/// Body of a summarisation request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryRequest {
    /// Didactic text to summarise (15 to 10000 characters)
    #[serde(rename = "texto")]
    pub text: String,
    /// Optional summary settings
    #[serde(default, rename = "opcoes")]
    pub options: Option<SummaryOptions>,
}

/// Metadata computed while processing a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingMetadata {
    /// Processing time in seconds
    #[serde(rename = "tempo_processamento")]
    pub elapsed_seconds: f64,
    /// Original text size in characters
    #[serde(rename = "tamanho_original")]
    pub original_length: usize,
    /// Summary size in characters
    #[serde(rename = "tamanho_resumo")]
    pub summary_length: usize,
    /// summary_length / original_length
    #[serde(rename = "taxa_compressao")]
    pub compression_ratio: f64,
}

impl ProcessingMetadata {
    /// Compute sizes and ratio for an original text and its summary
    pub fn compute(original: &str, summary: &str, elapsed_seconds: f64) -> Self {
        let original_length = original.chars().count();
        let summary_length = summary.chars().count();
        let compression_ratio = if original_length == 0 {
            0.0
        } else {
            summary_length as f64 / original_length as f64
        };

        Self {
            elapsed_seconds: elapsed_seconds.max(0.0),
            original_length,
            summary_length,
            compression_ratio,
        }
    }
}

/// Result of summarising a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResult {
    /// Simplified summary
    #[serde(rename = "resumo")]
    pub summary: String,
    /// Content classification. Never populated by the current pipeline.
    #[serde(rename = "classificacao")]
    pub classification: String,
    #[serde(default)]
    pub metadata: Option<ProcessingMetadata>,
}

/// A persisted summary, as returned by the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub id: u64,
    #[serde(rename = "texto_original")]
    pub original_text: String,
    #[serde(rename = "resumo")]
    pub summary: String,
    #[serde(rename = "classificacao")]
    pub classification: String,
    /// Rebuilt from the stored texts; elapsed time is not persisted
    pub metadata: ProcessingMetadata,
    #[serde(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}
