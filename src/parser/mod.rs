//! CSV parser module
//!
//! This module handles turning an uploaded export into records:
//! - Upload checks (extension, readability, encoding)
//! - Header/row splitting with numeric coercion
//! - Batched parsing with progress reporting for large files

pub mod chunked;
pub mod input;
pub mod tabular;

use thiserror::Error;

pub use chunked::{parse_chunked, DEFAULT_BATCH_SIZE};
pub use input::{check_extension, read_input};
pub use tabular::{parse, parse_table, ParsedTable};

/// Errors raised before any analysis can start
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file type: {0}. Please upload a CSV file")]
    UnsupportedExtension(String),

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File is not valid UTF-8 text: {0}")]
    InvalidEncoding(String),

    #[error("CSV header row is empty or missing")]
    EmptyHeader,
}
