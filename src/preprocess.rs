use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::models::{
    normalize_student_id, AttendanceRecord, ClassAttendance, MarksRecord, ScoredMark,
};

pub const MARKS_REQUIRED_COLUMNS: [&str; 6] =
    ["StudentID", "Subject", "Class", "T1Weight", "T2Weight", "T3Weight"];
pub const ATTENDANCE_REQUIRED_COLUMNS: [&str; 3] = ["StudentID", "Class", "Percentage"];

/// Fails with every required column that is absent from `headers`.
pub fn validate_columns<S: AsRef<str>>(
    table: &'static str,
    headers: &[S],
    required: &[&str],
) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !headers.iter().any(|header| header.as_ref().trim() == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::MissingColumns {
            table,
            columns: missing,
        })
    }
}

/// Derives `CalculatedFinalMark` for every marks row. z-scores are filled in later.
pub fn score_marks(marks: &[MarksRecord]) -> Vec<ScoredMark> {
    marks
        .iter()
        .map(|record| {
            let mut record = record.clone();
            record.student_id = normalize_student_id(&record.student_id);
            record.subject = record.subject.trim().to_string();
            record.class = record.class.trim().to_string();
            let final_mark = record.calculated_final_mark();
            ScoredMark {
                record,
                final_mark,
                z_score: None,
            }
        })
        .collect()
}

/// Rows that [`filter_attendance`] will drop because `Class Time` is blank or absent.
pub fn missing_class_time(rows: &[(AttendanceRecord, String)]) -> usize {
    rows.iter()
        .filter(|(record, _)| record.class_time.is_none())
        .count()
}

/// Keeps rows with enough scheduled class time whose class is not excluded,
/// and derives the attendance percentage for each.
pub fn filter_attendance(
    rows: Vec<(AttendanceRecord, String)>,
    config: &AnalysisConfig,
) -> Vec<ClassAttendance> {
    rows.into_iter()
        .filter(|(record, _)| {
            record
                .class_time
                .is_some_and(|class_time| class_time >= config.min_class_time)
        })
        .filter(|(record, _)| {
            config.excluded_class_marker.is_empty()
                || !record.class.contains(&config.excluded_class_marker)
        })
        .map(|(mut record, subject)| {
            record.student_id = normalize_student_id(&record.student_id);
            let attendance_percentage = record.attendance_percentage();
            ClassAttendance {
                record,
                subject,
                attendance_percentage,
            }
        })
        .collect()
}
