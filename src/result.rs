//! The JSON payload returned by an analysis run.
//!
//! Every float passes through [`nan_to_none`] or [`Metric`] on the way in, so
//! the serialized structure never carries a NaN.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::config::Thresholds;
use crate::models::{Cohorts, Regression, ScoredMark, YearGroupSummary};

pub fn nan_to_none(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// A regression figure, reported as `"N/A"` when it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotAvailable,
}

impl Metric {
    pub fn from_option(value: Option<f64>) -> Self {
        match value.and_then(nan_to_none) {
            Some(value) => Metric::Value(value),
            None => Metric::NotAvailable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(value) => Some(*value),
            Metric::NotAvailable => None,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(value) => serializer.serialize_f64(*value),
            Metric::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineOfBestFit {
    pub slope: Metric,
    pub intercept: Metric,
    pub r_value: Metric,
    pub p_value: Metric,
    pub std_err: Metric,
}

impl LineOfBestFit {
    pub fn from_regression(regression: Option<&Regression>) -> Self {
        let field = |pick: fn(&Regression) -> f64| Metric::from_option(regression.map(pick));
        Self {
            slope: field(|fit| fit.slope),
            intercept: field(|fit| fit.intercept),
            r_value: field(|fit| fit.r_value),
            p_value: field(|fit| fit.p_value),
            std_err: field(|fit| fit.std_err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainerText {
    pub correlation: String,
    pub regression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationAnalysis {
    pub correlation: Metric,
    pub observations: usize,
    pub line_of_best_fit: LineOfBestFit,
    pub explainer_text: ExplainerText,
    pub plot_filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotArtifacts {
    pub scatter: Option<String>,
    pub histogram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResults {
    pub run_id: Uuid,
    pub thresholds: Thresholds,
    pub low_z_scores: Vec<ScoredMark>,
    pub cohorts: Cohorts,
    pub average_marks_by_class: BTreeMap<String, Option<f64>>,
    pub correlation_analysis: CorrelationAnalysis,
    pub year_group_summary: Vec<YearGroupSummary>,
    pub plots: PlotArtifacts,
    pub warnings: Vec<String>,
}

/// Strips non-finite values from every numeric field of `results`.
pub fn sanitize(mut results: AnalysisResults) -> AnalysisResults {
    for mark in &mut results.low_z_scores {
        sanitize_mark(mark);
    }
    for average in results.average_marks_by_class.values_mut() {
        *average = average.and_then(nan_to_none);
    }
    for summary in &mut results.year_group_summary {
        for field in [
            &mut summary.mean,
            &mut summary.median,
            &mut summary.min,
            &mut summary.max,
            &mut summary.std,
            &mut summary.percent_above_90,
        ] {
            *field = field.and_then(nan_to_none);
        }
    }
    results
}

pub fn sanitize_mark(mark: &mut ScoredMark) {
    let record = &mut mark.record;
    for field in [
        &mut record.t1,
        &mut record.t2,
        &mut record.t3,
        &mut record.t4,
        &mut record.t1_weight,
        &mut record.t2_weight,
        &mut record.t3_weight,
        &mut mark.final_mark,
        &mut mark.z_score,
    ] {
        *field = field.and_then(nan_to_none);
    }
}
