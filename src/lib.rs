//! # Resumo
//!
//! An HTTP service that turns didactic texts into simplified summaries for
//! students with reading difficulties.
//!
//! ## Features
//!
//! - **Simplified Summaries**: one LLM call per text, cleaned up into plain text
//! - **Validation**: input and generated output are checked before anything is stored
//! - **History**: every accepted summary is kept in sled and listed newest first

pub mod agent;
pub mod api;
pub mod config;
pub mod logger;
pub mod pipeline;
pub mod processor;
pub mod storage;
pub mod summary;
pub mod validation;

pub use config::Config;
pub use pipeline::{PipelineError, SummaryService};
pub use processor::SummaryProcessor;
pub use storage::Storage;
pub use summary::{HistoricalRecord, ProcessingMetadata, SummaryOptions, SummaryResult};
