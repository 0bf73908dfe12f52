//! End-to-end analysis run.
//!
//! [`AnalysisContext`] carries everything a later step (report, lookup) needs.
//! It keeps the raw rows only; subjects, final marks and z-scores are derived
//! again by [`AnalysisContext::prepare`] whenever the context is used.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cohort;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::explain;
use crate::loader;
use crate::models::{AttendanceRecord, ClassAttendance, MarksRecord, Regression, ScoredMark};
use crate::plot;
use crate::preprocess;
use crate::reconcile::{self, SubjectMap};
use crate::result::{
    sanitize, AnalysisResults, CorrelationAnalysis, ExplainerText, LineOfBestFit, Metric,
    PlotArtifacts,
};
use crate::stats;
use crate::summary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub config: AnalysisConfig,
    pub attendance: Vec<AttendanceRecord>,
    pub marks: Vec<MarksRecord>,
}

/// Cleaned, reconciled and scored rows derived from a context.
#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    pub marks: Vec<ScoredMark>,
    pub attendance: Vec<ClassAttendance>,
    pub unmapped_classes: Vec<String>,
    /// Attendance rows dropped because they had no Class Time.
    pub missing_class_time: usize,
}

/// Paired `(attendance %, final mark)` observations joined on StudentID.
pub fn paired_observations(
    marks: &[ScoredMark],
    attendance: &[ClassAttendance],
    overall_class: Option<&str>,
) -> Vec<(f64, f64)> {
    let mut by_student: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in attendance {
        if overall_class.is_some_and(|label| row.record.class.trim() != label) {
            continue;
        }
        if let Some(pct) = row.attendance_percentage {
            by_student
                .entry(row.record.student_id.as_str())
                .or_default()
                .push(pct);
        }
    }

    let mut pairs = Vec::new();
    for mark in marks {
        let Some(final_mark) = mark.final_mark else {
            continue;
        };
        if let Some(percentages) = by_student.get(mark.record.student_id.as_str()) {
            pairs.extend(percentages.iter().map(|&pct| (pct, final_mark)));
        }
    }
    pairs
}

pub fn correlation_analysis(
    pairs: &[(f64, f64)],
) -> (CorrelationAnalysis, Option<Regression>) {
    let xs: Vec<f64> = pairs.iter().map(|pair| pair.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|pair| pair.1).collect();
    let correlation = stats::pearson(&xs, &ys);
    let regression = stats::linear_regression(&xs, &ys);

    let analysis = CorrelationAnalysis {
        correlation: Metric::from_option(correlation),
        observations: pairs.len(),
        line_of_best_fit: LineOfBestFit::from_regression(regression.as_ref()),
        explainer_text: ExplainerText {
            correlation: explain::correlation_explainer(correlation),
            regression: explain::regression_explainer(regression.as_ref()),
        },
        plot_filename: None,
    };
    (analysis, regression)
}

impl AnalysisContext {
    pub fn new(
        attendance: Vec<AttendanceRecord>,
        marks: Vec<MarksRecord>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            config,
            attendance,
            marks,
        }
    }

    /// Loads both exports; fails on unreadable files or missing columns.
    pub fn load(attendance_path: &Path, marks_path: &Path, config: AnalysisConfig) -> Result<Self> {
        let attendance = loader::read_attendance(attendance_path)?;
        let marks = loader::read_marks(marks_path)?;
        tracing::info!(
            attendance_rows = attendance.len(),
            marks_rows = marks.len(),
            "loaded exports"
        );
        Ok(Self::new(attendance, marks, config))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            AnalysisError::InvalidContext {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(|source| AnalysisError::Context {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AnalysisError::Context {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| AnalysisError::InvalidContext {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reconciles class labels, filters attendance and scores marks.
    pub fn prepare(&self) -> PreparedData {
        let subject_map =
            SubjectMap::from_marks(&self.marks).with_max_distance(self.config.max_class_distance);
        let reconciliation = reconcile::reconcile(self.attendance.clone(), &subject_map);
        if !reconciliation.unmapped_classes.is_empty() {
            tracing::warn!(
                classes = %reconciliation.unmapped_classes.join(", "),
                "missing subjects for classes; their attendance rows were dropped"
            );
        }
        tracing::debug!(
            classes = subject_map.len(),
            fallback_matches = reconciliation.fallback_matches,
            "reconciled attendance classes"
        );

        let missing_class_time = preprocess::missing_class_time(&reconciliation.matched);
        if missing_class_time > 0 {
            tracing::warn!(
                rows = missing_class_time,
                "attendance rows without Class Time were dropped"
            );
        }

        let mut marks = preprocess::score_marks(&self.marks);
        cohort::assign_z_scores(&mut marks);
        let attendance = preprocess::filter_attendance(reconciliation.matched, &self.config);
        tracing::info!(
            marks = marks.len(),
            attendance = attendance.len(),
            "preprocessed rows"
        );

        PreparedData {
            marks,
            attendance,
            unmapped_classes: reconciliation.unmapped_classes,
            missing_class_time,
        }
    }

    /// Runs every statistic and assembles the result payload. Plots are
    /// written into `plots_dir` when one is given.
    pub fn analyze(&self, plots_dir: Option<&Path>) -> Result<AnalysisResults> {
        let prepared = self.prepare();
        let thresholds = self.config.thresholds;

        let low_z_scores = cohort::low_z_scores(&prepared.marks, thresholds.low_marks);
        let cohorts = cohort::build_cohorts(&prepared.marks, &prepared.attendance, &thresholds);
        tracing::info!(
            low_z_scores = low_z_scores.len(),
            low_marks_students = cohorts.low_marks.len(),
            low_attendance_students = cohorts.low_attendance.len(),
            "identified cohorts"
        );

        let pairs = paired_observations(
            &prepared.marks,
            &prepared.attendance,
            self.config.overall_class.as_deref(),
        );
        let (mut correlation, regression) = correlation_analysis(&pairs);
        if regression.is_none() {
            tracing::warn!(
                observations = pairs.len(),
                "not enough paired observations for regression"
            );
        }

        let mut plots = PlotArtifacts::default();
        if let Some(dir) = plots_dir {
            std::fs::create_dir_all(dir).map_err(|source| AnalysisError::Context {
                path: dir.to_path_buf(),
                source,
            })?;
            if plot::scatter_plot(&dir.join(plot::SCATTER_FILENAME), &pairs, regression.as_ref())? {
                plots.scatter = Some(plot::SCATTER_FILENAME.to_string());
            }
            let final_marks: Vec<f64> =
                prepared.marks.iter().filter_map(|m| m.final_mark).collect();
            if plot::final_mark_histogram(&dir.join(plot::HISTOGRAM_FILENAME), &final_marks)? {
                plots.histogram = Some(plot::HISTOGRAM_FILENAME.to_string());
            }
        }
        correlation.plot_filename = plots.scatter.clone();

        let mut warnings: Vec<String> = prepared
            .unmapped_classes
            .iter()
            .map(|class| format!("Missing subject for class: {class}"))
            .collect();
        if prepared.missing_class_time > 0 {
            warnings.push(format!(
                "Dropped {} attendance row(s) with no Class Time",
                prepared.missing_class_time
            ));
        }

        Ok(sanitize(AnalysisResults {
            run_id: self.run_id,
            thresholds,
            low_z_scores,
            cohorts,
            average_marks_by_class: summary::average_marks_by_class(&prepared.marks),
            correlation_analysis: correlation,
            year_group_summary: summary::year_group_summary(&prepared.attendance),
            plots,
            warnings,
        }))
    }
}

/// Loads both exports and runs the analysis in one call.
pub fn perform_analysis(
    attendance_path: &Path,
    marks_path: &Path,
    config: AnalysisConfig,
    plots_dir: Option<&Path>,
) -> Result<(AnalysisContext, AnalysisResults)> {
    let context = AnalysisContext::load(attendance_path, marks_path, config)?;
    let results = context.analyze(plots_dir)?;
    Ok((context, results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendance(
        student_id: &str,
        class: &str,
        class_time: f64,
        absence_time: f64,
    ) -> AttendanceRecord {
        AttendanceRecord {
            student_id: student_id.to_string(),
            student_name: None,
            class: class.to_string(),
            class_time: Some(class_time),
            absence_time: Some(absence_time),
            percentage: None,
            school_year: Some("10".to_string()),
        }
    }

    fn marks(student_id: &str, subject: &str, class: &str, weight: f64) -> MarksRecord {
        MarksRecord {
            student_id: student_id.to_string(),
            student_name: None,
            subject: subject.to_string(),
            class: class.to_string(),
            t1: None,
            t2: None,
            t3: None,
            t4: None,
            t1_weight: Some(weight),
            t2_weight: Some(weight),
            t3_weight: Some(weight),
        }
    }

    #[test]
    fn single_student_end_to_end() {
        let context = AnalysisContext::new(
            vec![attendance("1", "10Bio", 1200.0, 120.0)],
            vec![marks("1", "Biology", "10Bio", 30.0)],
            AnalysisConfig::default(),
        );
        let prepared = context.prepare();
        assert_eq!(prepared.marks[0].final_mark, Some(90.0));
        assert_eq!(prepared.attendance[0].subject, "Biology");
        assert!((prepared.attendance[0].attendance_percentage.unwrap() - 90.0).abs() < 1e-9);

        let results = context.analyze(None).unwrap();
        assert_eq!(results.correlation_analysis.observations, 1);
        assert_eq!(results.correlation_analysis.correlation, Metric::NotAvailable);
        assert!(results.warnings.is_empty());
        assert_eq!(results.average_marks_by_class.get("10Bio"), Some(&Some(90.0)));
    }

    #[test]
    fn rows_without_class_time_are_warned_about() {
        let mut untimed = attendance("2", "10Bio", 0.0, 0.0);
        untimed.class_time = None;
        untimed.percentage = Some(80.0);
        let context = AnalysisContext::new(
            vec![attendance("1", "10Bio", 1200.0, 120.0), untimed],
            vec![marks("1", "Biology", "10Bio", 30.0)],
            AnalysisConfig::default(),
        );
        let prepared = context.prepare();
        assert_eq!(prepared.attendance.len(), 1);
        assert_eq!(prepared.missing_class_time, 1);

        let results = context.analyze(None).unwrap();
        assert_eq!(
            results.warnings,
            vec!["Dropped 1 attendance row(s) with no Class Time".to_string()]
        );
    }

    #[test]
    fn overall_class_restricts_pairs() {
        let prepared_attendance = vec![
            ClassAttendance {
                record: attendance("1", "Overall", 5000.0, 500.0),
                subject: "Biology".to_string(),
                attendance_percentage: Some(90.0),
            },
            ClassAttendance {
                record: attendance("1", "10Bio", 1200.0, 0.0),
                subject: "Biology".to_string(),
                attendance_percentage: Some(100.0),
            },
        ];
        let scored = preprocess::score_marks(&[marks("1", "Biology", "10Bio", 30.0)]);

        assert_eq!(paired_observations(&scored, &prepared_attendance, None).len(), 2);
        assert_eq!(
            paired_observations(&scored, &prepared_attendance, Some("Overall")),
            vec![(90.0, 90.0)]
        );
    }

    #[test]
    fn context_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        let context = AnalysisContext::new(
            vec![attendance("1", "10Bio", 1200.0, 120.0)],
            vec![marks("1", "Biology", "10Bio", 30.0)],
            AnalysisConfig::default(),
        );
        context.save(&path).unwrap();
        assert_eq!(AnalysisContext::open(&path).unwrap(), context);
    }

    #[test]
    fn unreadable_context_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AnalysisContext::open(&path),
            Err(AnalysisError::InvalidContext { .. })
        ));
    }
}
