//! Attendance and marks analysis for school spreadsheet exports.
//!
//! The pipeline loads an attendance export and a marks export, reconciles
//! class labels to subjects, derives final marks and attendance percentages,
//! and computes z-scores, threshold cohorts, correlation/regression and
//! year-group summaries. See [`pipeline::AnalysisContext`] for the entry point.

pub mod cohort;
pub mod config;
pub mod error;
pub mod explain;
pub mod loader;
pub mod lookup;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod preprocess;
pub mod reconcile;
pub mod report;
pub mod result;
pub mod stats;
pub mod summary;

pub use config::{AnalysisConfig, Thresholds};
pub use error::{AnalysisError, Result};
pub use pipeline::{perform_analysis, AnalysisContext, PreparedData};
pub use result::AnalysisResults;
