use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Cut-offs used by the cohort filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Attendance percentage below which a class is flagged.
    pub low_attendance: f64,
    /// Attendance percentage above which a class is flagged.
    pub high_attendance: f64,
    /// z-score below which a subject mark is flagged.
    pub low_marks: f64,
    /// z-score above which a subject mark is flagged.
    pub high_marks: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low_attendance: 85.0,
            high_attendance: 95.0,
            low_marks: -1.2,
            high_marks: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub school_name: String,
    pub program_title: String,
    /// Minimum number of low-mark subjects before a student gets a report.
    pub min_flagged_subjects: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            school_name: "Senior High School".to_string(),
            program_title: "ACADEMIC IMPROVEMENT PROGRAM".to_string(),
            min_flagged_subjects: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Attendance rows with less scheduled class time are ignored.
    pub min_class_time: f64,
    /// Attendance rows whose class label contains this marker are ignored.
    pub excluded_class_marker: String,
    /// Upper bound on the edit distance accepted for a fallback class match.
    pub max_class_distance: Option<usize>,
    /// When set, only attendance rows with this class label feed the
    /// correlation (e.g. an "Overall" summary row per student).
    pub overall_class: Option<String>,
    pub thresholds: Thresholds,
    pub report: ReportSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_class_time: 1000.0,
            excluded_class_marker: "MEN".to_string(),
            max_class_distance: None,
            overall_class: None,
            thresholds: Thresholds::default(),
            report: ReportSettings::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|err| AnalysisError::InvalidConfig {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        toml::from_str(&content).map_err(|err| AnalysisError::InvalidConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|err| AnalysisError::InvalidConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        std::fs::write(path, content).map_err(|err| AnalysisError::InvalidConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}
