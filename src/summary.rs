use std::collections::BTreeMap;

use crate::models::{ClassAttendance, ScoredMark, YearGroupSummary};
use crate::stats;

/// Mean final mark per class label, ordered by label.
pub fn average_marks_by_class(marks: &[ScoredMark]) -> BTreeMap<String, Option<f64>> {
    let mut by_class: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for mark in marks {
        let values = by_class.entry(mark.record.class.clone()).or_default();
        if let Some(final_mark) = mark.final_mark {
            values.push(final_mark);
        }
    }

    by_class
        .into_iter()
        .map(|(class, values)| (class, stats::mean(&values)))
        .collect()
}

/// Attendance statistics per school year over each student's mean attendance.
pub fn year_group_summary(attendance: &[ClassAttendance]) -> Vec<YearGroupSummary> {
    let mut per_student: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for row in attendance {
        let (Some(year), Some(pct)) = (row.record.school_year.as_deref(), row.attendance_percentage)
        else {
            continue;
        };
        per_student
            .entry((year.trim().to_string(), row.record.student_id.clone()))
            .or_default()
            .push(pct);
    }

    let mut per_year: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for ((year, _), values) in per_student {
        if let Some(mean) = stats::mean(&values) {
            per_year.entry(year).or_default().push(mean);
        }
    }

    per_year
        .into_iter()
        .map(|(school_year, means)| {
            let above = means.iter().filter(|&&mean| mean > 90.0).count();
            YearGroupSummary {
                school_year,
                students: means.len(),
                mean: stats::mean(&means),
                median: stats::median(&means),
                min: stats::min(&means),
                max: stats::max(&means),
                std: stats::sample_std(&means),
                percent_above_90: if means.is_empty() {
                    None
                } else {
                    Some(above as f64 / means.len() as f64 * 100.0)
                },
            }
        })
        .collect()
}
