use std::fmt::Write;

use chrono::{Datelike, NaiveDate};

use crate::config::ReportSettings;
use crate::models::{ClassAttendance, CohortEntry, ScoredMark};
use crate::stats;

/// Short forms used in the results table for long subject names.
const SUBJECT_ABBREVIATIONS: [(&str, &str); 9] = [
    ("Community & Family Studies", "CAFS"),
    ("Earth & Environmental Science", "Earth & Env. Sci."),
    ("English Extension 1", "Eng Ext 1"),
    ("English Standard", "Eng Std"),
    ("Information Processes & Technology", "IPT"),
    ("Mathematics Advanced", "Math Adv"),
    ("Mathematics Extension 1", "Math Ext 1"),
    ("Mathematics Standard 2", "Math Std 2"),
    ("Software Design & Development", "SDD"),
];

pub fn abbreviate_subject(subject: &str) -> &str {
    SUBJECT_ABBREVIATIONS
        .iter()
        .find(|(long, _)| *long == subject)
        .map(|(_, short)| *short)
        .unwrap_or(subject)
}

/// Students from the low-marks cohort with at least `min_subjects` flagged subjects.
pub fn flagged_students(low_marks: &[CohortEntry], min_subjects: usize) -> Vec<String> {
    low_marks
        .iter()
        .filter(|entry| entry.subject_count >= min_subjects.max(1))
        .map(|entry| entry.student_id.clone())
        .collect()
}

fn number(value: f64) -> String {
    format!("{}", (value * 100.0).round() / 100.0)
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{}%", number(value)),
        None => "-".to_string(),
    }
}

fn student_label(
    student_id: &str,
    marks: &[&ScoredMark],
    attendance: &[&ClassAttendance],
) -> String {
    marks
        .iter()
        .filter_map(|mark| mark.record.student_name.as_deref())
        .chain(attendance.iter().filter_map(|row| row.record.student_name.as_deref()))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(student_id)
        .to_string()
}

/// Renders one Markdown section per student, separated by horizontal rules.
pub fn build_report(
    marks: &[ScoredMark],
    attendance: &[ClassAttendance],
    student_ids: &[String],
    settings: &ReportSettings,
    generated_on: NaiveDate,
) -> String {
    let mut output = String::new();

    if student_ids.is_empty() {
        let _ = writeln!(output, "# {}", settings.school_name);
        let _ = writeln!(output, "## {}", settings.program_title);
        let _ = writeln!(output);
        let _ = writeln!(output, "No students met the reporting criteria.");
        return output;
    }

    for (position, student_id) in student_ids.iter().enumerate() {
        if position > 0 {
            let _ = writeln!(output);
            let _ = writeln!(output, "---");
            let _ = writeln!(output);
        }
        write_student(&mut output, student_id, marks, attendance, settings, generated_on);
    }

    output
}

fn write_student(
    output: &mut String,
    student_id: &str,
    marks: &[ScoredMark],
    attendance: &[ClassAttendance],
    settings: &ReportSettings,
    generated_on: NaiveDate,
) {
    let student_marks: Vec<&ScoredMark> = marks
        .iter()
        .filter(|mark| mark.record.student_id == student_id)
        .collect();
    let student_attendance: Vec<&ClassAttendance> = attendance
        .iter()
        .filter(|row| row.record.student_id == student_id)
        .collect();

    let school_year = student_attendance
        .iter()
        .find_map(|row| row.record.school_year.as_deref())
        .unwrap_or("N/A");
    let year = generated_on.year();

    let _ = writeln!(output, "# {}", settings.school_name);
    let _ = writeln!(output, "## {}", settings.program_title);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "### {} - {} - Year {}",
        student_label(student_id, &student_marks, &student_attendance),
        generated_on.format("%d %B %Y"),
        school_year
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "#### Academic Results {year}:");
    let _ = writeln!(output);
    let has_term_four = student_marks.iter().any(|mark| mark.record.t4.is_some());
    if has_term_four {
        let _ = writeln!(
            output,
            "| Subject | Term 1 Mark | Term 2 Mark | Term 3 Mark | Term 4 Mark | Final Mark \
             | Final z-Score |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    } else {
        let _ = writeln!(
            output,
            "| Subject | Term 1 Mark | Term 2 Mark | Term 3 Mark | Final Mark | Final z-Score |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|");
    }
    for mark in &student_marks {
        let record = &mark.record;
        let z_score = mark
            .z_score
            .map(|z| format!("{z:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let mut cells = vec![
            abbreviate_subject(&record.subject).to_string(),
            percent(record.t1),
            percent(record.t2),
            percent(record.t3),
        ];
        if has_term_four {
            cells.push(percent(record.t4));
        }
        cells.push(percent(mark.final_mark));
        cells.push(z_score);
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "#### Attendance {year}:");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Class | Percentage |");
    let _ = writeln!(output, "|---|---|");
    let percentages: Vec<f64> = student_attendance
        .iter()
        .filter_map(|row| row.attendance_percentage)
        .collect();
    let _ = writeln!(
        output,
        "| Overall Attendance | {} |",
        percent(stats::mean(&percentages))
    );
    for row in &student_attendance {
        let _ = writeln!(
            output,
            "| {} | {} |",
            abbreviate_subject(&row.subject),
            percent(row.attendance_percentage)
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Deputy Principal Sign Off: ___________________________");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, MarksRecord};

    fn mark(student_id: &str, subject: &str, t4: Option<f64>, z_score: Option<f64>) -> ScoredMark {
        ScoredMark {
            record: MarksRecord {
                student_id: student_id.to_string(),
                student_name: Some("Avery Lee".to_string()),
                subject: subject.to_string(),
                class: "12X".to_string(),
                t1: Some(55.0),
                t2: None,
                t3: Some(61.25),
                t4,
                t1_weight: Some(20.0),
                t2_weight: Some(20.0),
                t3_weight: Some(20.5),
            },
            final_mark: Some(60.5),
            z_score,
        }
    }

    fn attendance(student_id: &str, subject: &str, pct: f64) -> ClassAttendance {
        ClassAttendance {
            record: AttendanceRecord {
                student_id: student_id.to_string(),
                student_name: None,
                class: "12X".to_string(),
                class_time: Some(1200.0),
                absence_time: None,
                percentage: Some(pct),
                school_year: Some("12".to_string()),
            },
            subject: subject.to_string(),
            attendance_percentage: Some(pct),
        }
    }

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn renders_results_and_attendance_tables() {
        let marks = vec![
            mark("1", "Mathematics Advanced", None, Some(-1.456)),
            mark("1", "English Standard", None, None),
            mark("2", "Biology", None, Some(0.5)),
        ];
        let rows = vec![
            attendance("1", "Mathematics Advanced", 80.0),
            attendance("1", "English Standard", 90.0),
        ];
        let report = build_report(
            &marks,
            &rows,
            &["1".to_string()],
            &ReportSettings::default(),
            generated_on(),
        );

        assert!(report.contains("### Avery Lee - 16 October 2026 - Year 12"));
        assert!(report.contains("#### Academic Results 2026:"));
        assert!(report.contains("| Math Adv | 55% | - | 61.25% | 60.5% | -1.46 |"));
        assert!(report.contains("| Eng Std | 55% | - | 61.25% | 60.5% | - |"));
        assert!(report.contains("| Overall Attendance | 85% |"));
        assert!(!report.contains("Term 4 Mark"));
        assert!(!report.contains("Biology"));
    }

    #[test]
    fn term_four_column_appears_when_present() {
        let marks = vec![mark("1", "Biology", Some(72.0), Some(-2.0))];
        let report = build_report(
            &marks,
            &[],
            &["1".to_string()],
            &ReportSettings::default(),
            generated_on(),
        );
        assert!(report.contains("Term 4 Mark"));
        assert!(report.contains("| Biology | 55% | - | 61.25% | 72% | 60.5% | -2.00 |"));
        assert!(report.contains("Year N/A"));
        assert!(report.contains("| Overall Attendance | - |"));
    }

    #[test]
    fn students_are_separated() {
        let marks = vec![mark("1", "Biology", None, None), mark("2", "Biology", None, None)];
        let report = build_report(
            &marks,
            &[],
            &["1".to_string(), "2".to_string()],
            &ReportSettings::default(),
            generated_on(),
        );
        assert_eq!(report.matches("\n---\n").count(), 1);
        assert_eq!(report.matches("Deputy Principal Sign Off").count(), 2);
    }

    #[test]
    fn flagged_students_need_enough_subjects() {
        let cohort = vec![
            CohortEntry {
                student_id: "1".to_string(),
                subjects: vec!["Biology".to_string(), "Music".to_string()],
                subject_count: 2,
            },
            CohortEntry {
                student_id: "2".to_string(),
                subjects: vec!["Art".to_string()],
                subject_count: 1,
            },
        ];
        assert_eq!(flagged_students(&cohort, 2), vec!["1".to_string()]);
        assert_eq!(flagged_students(&cohort, 1).len(), 2);
    }
}
