use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{AnalysisError, Result};
use crate::models::{AttendanceRecord, MarksRecord};
use crate::preprocess::{validate_columns, ATTENDANCE_REQUIRED_COLUMNS, MARKS_REQUIRED_COLUMNS};

pub fn read_attendance(path: &Path) -> Result<Vec<AttendanceRecord>> {
    read_table(path, "attendance", &ATTENDANCE_REQUIRED_COLUMNS)
}

pub fn read_marks(path: &Path) -> Result<Vec<MarksRecord>> {
    read_table(path, "marks", &MARKS_REQUIRED_COLUMNS)
}

fn read_table<T: DeserializeOwned>(
    path: &Path,
    table: &'static str,
    required: &[&str],
) -> Result<Vec<T>> {
    let unreadable = |source: csv::Error| AnalysisError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    };
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(unreadable)?;
    read_records(reader, table, required).map_err(|err| match err {
        ReadError::Csv(source) => unreadable(source),
        ReadError::Analysis(err) => err,
    })
}

/// Reads a table from any reader; `source` names it in error messages.
pub fn read_table_from<R: Read, T: DeserializeOwned>(
    input: R,
    source: &Path,
    table: &'static str,
    required: &[&str],
) -> Result<Vec<T>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    read_records(reader, table, required).map_err(|err| match err {
        ReadError::Csv(err) => AnalysisError::UnreadableFile {
            path: source.to_path_buf(),
            source: err,
        },
        ReadError::Analysis(err) => err,
    })
}

enum ReadError {
    Csv(csv::Error),
    Analysis(AnalysisError),
}

fn read_records<R: Read, T: DeserializeOwned>(
    mut reader: csv::Reader<R>,
    table: &'static str,
    required: &[&str],
) -> std::result::Result<Vec<T>, ReadError> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(ReadError::Csv)?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    validate_columns(table, &headers, required).map_err(ReadError::Analysis)?;
    reader.set_headers(csv::StringRecord::from(headers));

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(ReadError::Csv)?);
    }
    tracing::debug!(table, rows = rows.len(), "loaded table");
    Ok(rows)
}
