use serde::{Deserialize, Serialize};

/// One row of the attendance export. Column names follow the spreadsheet headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "Student Name", default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "Class Time", default, deserialize_with = "finite_option")]
    pub class_time: Option<f64>,
    #[serde(rename = "Absence Time", default, deserialize_with = "finite_option")]
    pub absence_time: Option<f64>,
    #[serde(rename = "Percentage", default, deserialize_with = "finite_option")]
    pub percentage: Option<f64>,
    #[serde(rename = "School Year", default, skip_serializing_if = "Option::is_none")]
    pub school_year: Option<String>,
}

/// One row of the marks export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksRecord {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "Student Name", default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "T1", default, deserialize_with = "finite_option")]
    pub t1: Option<f64>,
    #[serde(rename = "T2", default, deserialize_with = "finite_option")]
    pub t2: Option<f64>,
    #[serde(rename = "T3", default, deserialize_with = "finite_option")]
    pub t3: Option<f64>,
    #[serde(rename = "T4", default, deserialize_with = "finite_option")]
    pub t4: Option<f64>,
    #[serde(rename = "T1Weight", default, deserialize_with = "finite_option")]
    pub t1_weight: Option<f64>,
    #[serde(rename = "T2Weight", default, deserialize_with = "finite_option")]
    pub t2_weight: Option<f64>,
    #[serde(rename = "T3Weight", default, deserialize_with = "finite_option")]
    pub t3_weight: Option<f64>,
}

/// Reads a numeric cell; blank, unparseable and non-finite cells become `None`.
fn finite_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<f64> = csv::invalid_option(deserializer)?;
    Ok(value.filter(|value| value.is_finite()))
}

impl MarksRecord {
    /// Sum of the three term weights; missing if any weight is missing.
    pub fn calculated_final_mark(&self) -> Option<f64> {
        Some(self.t1_weight? + self.t2_weight? + self.t3_weight?).filter(|mark| mark.is_finite())
    }
}

impl AttendanceRecord {
    /// `100 - Absence Time / Class Time * 100`, falling back to the recorded
    /// percentage when the absence time is not available.
    pub fn attendance_percentage(&self) -> Option<f64> {
        match (self.class_time, self.absence_time) {
            (Some(class_time), Some(absence_time)) if class_time > 0.0 => {
                Some(100.0 - absence_time / class_time * 100.0).filter(|pct| pct.is_finite())
            }
            _ => self.percentage.filter(|value| value.is_finite()),
        }
    }
}

/// A marks row with its derived final mark and per-subject z-score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMark {
    #[serde(flatten)]
    pub record: MarksRecord,
    #[serde(rename = "CalculatedFinalMark")]
    pub final_mark: Option<f64>,
    #[serde(rename = "zScore")]
    pub z_score: Option<f64>,
}

/// An attendance row that survived reconciliation and filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAttendance {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "OverallAttendancePercentage")]
    pub attendance_percentage: Option<f64>,
}

/// A student matched by one of the threshold filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortEntry {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "Subjects")]
    pub subjects: Vec<String>,
    #[serde(rename = "SubjectCount")]
    pub subject_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cohorts {
    pub low_marks: Vec<CohortEntry>,
    pub high_marks: Vec<CohortEntry>,
    pub low_attendance: Vec<CohortEntry>,
    pub high_attendance: Vec<CohortEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub std_err: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroupSummary {
    pub school_year: String,
    pub students: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
    pub percent_above_90: Option<f64>,
}

/// Trims an identifier and drops the `.0` suffix spreadsheets add to whole numbers.
pub fn normalize_student_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_suffix(".0") {
        Some(whole) if !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()) => {
            whole.to_string()
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(t1: Option<f64>, t2: Option<f64>, t3: Option<f64>) -> MarksRecord {
        MarksRecord {
            student_id: "1".to_string(),
            student_name: None,
            subject: "Biology".to_string(),
            class: "10Bio".to_string(),
            t1: None,
            t2: None,
            t3: None,
            t4: None,
            t1_weight: t1,
            t2_weight: t2,
            t3_weight: t3,
        }
    }

    #[test]
    fn final_mark_sums_weights() {
        assert_eq!(
            marks(Some(30.0), Some(30.0), Some(30.0)).calculated_final_mark(),
            Some(90.0)
        );
        assert_eq!(marks(Some(30.0), None, Some(30.0)).calculated_final_mark(), None);
    }

    #[test]
    fn non_finite_weights_give_no_final_mark() {
        assert_eq!(
            marks(Some(f64::NAN), Some(30.0), Some(30.0)).calculated_final_mark(),
            None
        );
        assert_eq!(
            marks(Some(f64::MAX), Some(f64::MAX), Some(30.0)).calculated_final_mark(),
            None
        );
    }

    #[test]
    fn attendance_percentage_prefers_times() {
        let record = AttendanceRecord {
            student_id: "1".to_string(),
            student_name: None,
            class: "10Bio".to_string(),
            class_time: Some(1200.0),
            absence_time: Some(120.0),
            percentage: Some(50.0),
            school_year: None,
        };
        assert!((record.attendance_percentage().unwrap() - 90.0).abs() < 1e-9);

        let without_absence = AttendanceRecord {
            absence_time: None,
            ..record
        };
        assert_eq!(without_absence.attendance_percentage(), Some(50.0));
    }

    #[test]
    fn student_ids_are_normalized() {
        assert_eq!(normalize_student_id(" 1042.0 "), "1042");
        assert_eq!(normalize_student_id("A12"), "A12");
        assert_eq!(normalize_student_id("12.5"), "12.5");
    }
}
