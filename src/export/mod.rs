//! One-way export projections
//!
//! CSV renders any record collection as a flat table; Markdown renders
//! generated project documents, retro sessions and the decision log. Nothing
//! here reads exported files back.

pub mod csv;
pub mod markdown;

use thiserror::Error;

pub use self::csv::{raci_to_csv, to_csv, CsvRow};
pub use self::markdown::MarkdownRenderer;

/// Errors raised while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("CSV output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("template '{name}' failed to render: {reason}")]
    Render { name: String, reason: String },

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("the active project has no {0} document")]
    MissingDocument(String),
}
