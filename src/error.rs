use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or analysing the two exports.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing required column(s) in {table} data: {}", .columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid configuration in {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Failed to render plot {}: {message}", .path.display())]
    Plot { path: PathBuf, message: String },

    #[error("Failed to access context file {}: {source}", .path.display())]
    Context {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Context file {} is not valid: {source}", .path.display())]
    InvalidContext {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
