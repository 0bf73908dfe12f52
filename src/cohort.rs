use std::collections::HashMap;

use crate::config::Thresholds;
use crate::models::{ClassAttendance, CohortEntry, Cohorts, ScoredMark};
use crate::stats;

/// Fills in `z_score` for every mark, standardised within its subject.
pub fn assign_z_scores(marks: &mut [ScoredMark]) {
    let mut by_subject: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, mark) in marks.iter().enumerate() {
        if mark.final_mark.is_some() {
            by_subject
                .entry(mark.record.subject.clone())
                .or_default()
                .push(position);
        }
    }

    for positions in by_subject.values() {
        let values: Vec<f64> = positions
            .iter()
            .filter_map(|&position| marks[position].final_mark)
            .collect();
        for (&position, z_score) in positions.iter().zip(stats::z_scores(&values)) {
            marks[position].z_score = z_score;
        }
    }
}

/// Groups `(student, subject)` matches per student, most subjects first.
///
/// Students with equal counts keep the order in which they were first matched.
pub fn group_subjects<'a, I>(matches: I) -> Vec<CohortEntry>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<CohortEntry> = Vec::new();

    for (student_id, subject) in matches {
        let position = *positions.entry(student_id).or_insert_with(|| {
            entries.push(CohortEntry {
                student_id: student_id.to_string(),
                subjects: Vec::new(),
                subject_count: 0,
            });
            entries.len() - 1
        });
        let entry = &mut entries[position];
        entry.subjects.push(subject.to_string());
        entry.subject_count += 1;
    }

    entries.sort_by(|a, b| b.subject_count.cmp(&a.subject_count));
    entries
}

pub fn marks_below(marks: &[ScoredMark], threshold: f64) -> Vec<CohortEntry> {
    group_subjects(
        marks
            .iter()
            .filter(|mark| mark.z_score.is_some_and(|z| z < threshold))
            .map(|mark| (mark.record.student_id.as_str(), mark.record.subject.as_str())),
    )
}

pub fn marks_above(marks: &[ScoredMark], threshold: f64) -> Vec<CohortEntry> {
    group_subjects(
        marks
            .iter()
            .filter(|mark| mark.z_score.is_some_and(|z| z > threshold))
            .map(|mark| (mark.record.student_id.as_str(), mark.record.subject.as_str())),
    )
}

pub fn attendance_below(attendance: &[ClassAttendance], threshold: f64) -> Vec<CohortEntry> {
    group_subjects(
        attendance
            .iter()
            .filter(|row| row.attendance_percentage.is_some_and(|pct| pct < threshold))
            .map(|row| (row.record.student_id.as_str(), row.subject.as_str())),
    )
}

pub fn attendance_above(attendance: &[ClassAttendance], threshold: f64) -> Vec<CohortEntry> {
    group_subjects(
        attendance
            .iter()
            .filter(|row| row.attendance_percentage.is_some_and(|pct| pct > threshold))
            .map(|row| (row.record.student_id.as_str(), row.subject.as_str())),
    )
}

/// Marks rows whose z-score falls under the low-marks threshold.
pub fn low_z_scores(marks: &[ScoredMark], threshold: f64) -> Vec<ScoredMark> {
    marks
        .iter()
        .filter(|mark| mark.z_score.is_some_and(|z| z < threshold))
        .cloned()
        .collect()
}

pub fn build_cohorts(
    marks: &[ScoredMark],
    attendance: &[ClassAttendance],
    thresholds: &Thresholds,
) -> Cohorts {
    Cohorts {
        low_marks: marks_below(marks, thresholds.low_marks),
        high_marks: marks_above(marks, thresholds.high_marks),
        low_attendance: attendance_below(attendance, thresholds.low_attendance),
        high_attendance: attendance_above(attendance, thresholds.high_attendance),
    }
}
