use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

const ATTENDANCE_CSV: &str = "\
StudentID,Student Name,Class,Class Time,Absence Time,Percentage,School Year
1,Avery Lee,12Bio,1200,360,70,12
1,Avery Lee,12Chm,1200,300,75,12
2,Jules Moreno,12Bio,1200,12,99,12
2,Jules Moreno,12Chm,1200,24,98,12
3,Kiara Patel,12Bio,1200,60,95,12
3,Kiara Patel,12Chm,1200,48,96,12
4,Sam Ortiz,12Bio,1200,96,92,12
4,Sam Ortiz,12Chm,1200,84,93,12
";

const MARKS_CSV: &str = "\
StudentID,Student Name,Subject,Class,T1,T2,T3,T1Weight,T2Weight,T3Weight
1,Avery Lee,Biology,12Bio,30,35,40,10,11,12
1,Avery Lee,Chemistry,12Chm,25,30,35,8,10,11
2,Jules Moreno,Biology,12Bio,85,88,90,28,29,30
2,Jules Moreno,Chemistry,12Chm,80,82,85,26,27,28
3,Kiara Patel,Biology,12Bio,78,80,82,26,26,27
3,Kiara Patel,Chemistry,12Chm,76,78,80,25,26,26
4,Sam Ortiz,Biology,12Bio,80,82,84,26,27,28
4,Sam Ortiz,Chemistry,12Chm,79,80,83,26,26,27
";

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("attendance.csv"), ATTENDANCE_CSV).unwrap();
    fs::write(dir.path().join("marks.csv"), MARKS_CSV).unwrap();
    dir
}

#[test]
fn analyze_prints_json_result() {
    let dir = setup();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis");
    cmd.current_dir(dir.path())
        .args(["analyze", "--attendance", "attendance.csv", "--marks", "marks.csv"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"correlation_analysis\""))
        .stdout(predicate::str::contains("\"low_marks\""))
        .stdout(predicate::str::contains("\"year_group_summary\""));
}

#[test]
fn analyze_then_report_flags_struggling_student() {
    let dir = setup();
    let mut analyze = assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis");
    analyze
        .current_dir(dir.path())
        .args([
            "analyze",
            "--attendance",
            "attendance.csv",
            "--marks",
            "marks.csv",
            "--low-marks",
            "-1.2",
            "--out",
            "results.json",
            "--context",
            "context.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results written to results.json."));

    let results: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("results.json")).unwrap())
            .unwrap();
    assert_eq!(results["cohorts"]["low_marks"][0]["StudentID"], "1");
    assert_eq!(results["cohorts"]["low_marks"][0]["SubjectCount"], 2);

    let mut report = assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis");
    report
        .current_dir(dir.path())
        .args(["report", "--context", "context.json", "--out", "report.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report for 1 students written to report.md."));

    let document = fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(document.contains("Avery Lee"));
    assert!(document.contains("| Overall Attendance | 72.5% |"));
    assert!(!document.contains("Jules Moreno"));
}

#[test]
fn students_search_uses_saved_context() {
    let dir = setup();
    assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis")
        .current_dir(dir.path())
        .args([
            "analyze",
            "--attendance",
            "attendance.csv",
            "--marks",
            "marks.csv",
            "--out",
            "results.json",
            "--context",
            "context.json",
        ])
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis")
        .current_dir(dir.path())
        .args(["students", "--context", "context.json", "--query", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kiara Patel"))
        .stdout(predicate::str::contains("Jules Moreno").not());
}

#[test]
fn missing_columns_fail_with_message() {
    let dir = setup();
    fs::write(dir.path().join("marks.csv"), "StudentID,Subject\n1,Biology\n").unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("attendance-marks-analysis")
        .current_dir(dir.path())
        .args(["analyze", "--attendance", "attendance.csv", "--marks", "marks.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Missing required column(s) in marks data: Class, T1Weight, T2Weight, T3Weight",
        ));
}
