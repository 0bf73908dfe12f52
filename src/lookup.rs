use serde::Serialize;

use crate::models::{ClassAttendance, ScoredMark};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "StudentName")]
    pub student_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDetail {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "StudentName")]
    pub student_name: String,
    #[serde(rename = "Marks")]
    pub marks: Vec<ScoredMark>,
    #[serde(rename = "Attendance")]
    pub attendance: Vec<ClassAttendance>,
}

/// Distinct students across both tables in first-seen order, attendance first.
pub fn list_students(marks: &[ScoredMark], attendance: &[ClassAttendance]) -> Vec<StudentSummary> {
    let mut students: Vec<StudentSummary> = Vec::new();
    let rows = attendance
        .iter()
        .map(|row| (&row.record.student_id, row.record.student_name.as_deref()))
        .chain(
            marks
                .iter()
                .map(|mark| (&mark.record.student_id, mark.record.student_name.as_deref())),
        );

    for (student_id, name) in rows {
        let name = name.map(str::trim).unwrap_or_default();
        match students.iter_mut().find(|s| &s.student_id == student_id) {
            Some(existing) => {
                if existing.student_name.is_empty() && !name.is_empty() {
                    existing.student_name = name.to_string();
                }
            }
            None => students.push(StudentSummary {
                student_id: student_id.clone(),
                student_name: name.to_string(),
            }),
        }
    }

    students
}

/// Students whose identifier contains `query` (case-insensitive), with their rows.
pub fn search_students(
    marks: &[ScoredMark],
    attendance: &[ClassAttendance],
    query: &str,
) -> Vec<StudentDetail> {
    let query = query.trim().to_lowercase();
    list_students(marks, attendance)
        .into_iter()
        .filter(|student| student.student_id.to_lowercase().contains(&query))
        .map(|student| StudentDetail {
            marks: marks
                .iter()
                .filter(|mark| mark.record.student_id == student.student_id)
                .cloned()
                .collect(),
            attendance: attendance
                .iter()
                .filter(|row| row.record.student_id == student.student_id)
                .cloned()
                .collect(),
            student_id: student.student_id,
            student_name: student.student_name,
        })
        .collect()
}
