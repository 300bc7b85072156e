use super::*;
use crate::error::EstaturaError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "date,time_hours,height_cm").expect("write header");
    for row in rows {
        writeln!(file, "{row}").expect("write row");
    }
    file
}

#[test]
fn test_loader_row_count_and_types() {
    let file = write_csv(&[
        "2024-01-08,7.5,196.4",
        "2024-01-09,21.0,197.2",
        "2024-01-10,0,196.6",
    ]);

    let dataset = HeightDataset::from_csv(file.path()).expect("load CSV");

    assert_eq!(dataset.len(), 3);
    let obs = dataset.observations();
    assert_eq!(
        obs[0].date,
        NaiveDate::from_ymd_opt(2024, 1, 8).expect("valid date")
    );
    assert!((obs[0].time_hours - 7.5).abs() < 1e-12);
    assert!((obs[1].height_cm - 197.2).abs() < 1e-12);
}

#[test]
fn test_loader_missing_file() {
    let err = HeightDataset::from_csv("no/such/heights.csv").unwrap_err();
    assert!(matches!(err, EstaturaError::Io { .. }));
}

#[test]
fn test_loader_schema_mismatch() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "date,height").expect("write header");
    writeln!(file, "2024-01-08,196.4").expect("write row");

    let err = HeightDataset::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, EstaturaError::SchemaMismatch { .. }));
}

#[test]
fn test_loader_bad_date() {
    let file = write_csv(&["08/01/2024,7.5,196.4"]);

    let err = HeightDataset::from_csv(file.path()).unwrap_err();
    match err {
        EstaturaError::CsvParse { line, column, .. } => {
            assert_eq!(line, 2);
            assert_eq!(column, "date");
        }
        other => panic!("expected CsvParse, got {other}"),
    }
}

#[test]
fn test_loader_bad_height() {
    let file = write_csv(&["2024-01-08,7.5,196.4", "2024-01-09,8.0,tall"]);

    let err = HeightDataset::from_csv(file.path()).unwrap_err();
    match err {
        EstaturaError::CsvParse { line, column, .. } => {
            assert_eq!(line, 3);
            assert_eq!(column, "height_cm");
        }
        other => panic!("expected CsvParse, got {other}"),
    }
}

#[test]
fn test_loader_hour_out_of_range() {
    let file = write_csv(&["2024-01-08,24.5,196.4"]);

    let err = HeightDataset::from_csv(file.path()).unwrap_err();
    assert!(matches!(
        err,
        EstaturaError::CsvParse { ref column, .. } if column == "time_hours"
    ));
}

#[test]
fn test_loader_empty_file() {
    let file = write_csv(&[]);

    let err = HeightDataset::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, EstaturaError::EmptyData { .. }));
}

#[test]
fn test_weekday_deterministic() {
    // Same date always yields the same label.
    let date = NaiveDate::from_ymd_opt(2024, 1, 8).expect("valid date");
    let obs = Observation {
        date,
        time_hours: 7.5,
        height_cm: 196.4,
    };
    assert_eq!(obs.weekday(), Weekday::Mon);
    assert_eq!(obs.weekday(), Weekday::Mon);
    assert_eq!(weekday_label(obs.weekday()), "Monday");
}

#[test]
fn test_weekday_labels_canonical_order() {
    let labels: Vec<&str> = WEEKDAY_ORDER.iter().map(|&d| weekday_label(d)).collect();
    assert_eq!(
        labels,
        vec![
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday"
        ]
    );
    for (i, &day) in WEEKDAY_ORDER.iter().enumerate() {
        assert_eq!(weekday_index(day), i);
    }
}

#[test]
fn test_timed_view_excludes_midnight() {
    let file = write_csv(&[
        "2024-01-08,7.5,196.4",
        "2024-01-09,0,197.2",
        "2024-01-10,21.0,196.6",
    ]);

    let dataset = HeightDataset::from_csv(file.path()).expect("load CSV");
    let timed = dataset.timed();

    assert_eq!(dataset.len(), 3);
    assert_eq!(timed.len(), 2);
    assert!(timed.iter().all(|o| o.time_hours != 0.0));
}

#[test]
fn test_describe() {
    let file = write_csv(&[
        "2024-01-08,7.5,196.0",
        "2024-01-09,8.0,197.0",
        "2024-01-10,9.0,196.5",
    ]);

    let dataset = HeightDataset::from_csv(file.path()).expect("load CSV");
    let summary = dataset.describe();

    assert_eq!(summary.n, 3);
    assert!((summary.mean - 196.5).abs() < 1e-9);
    assert!((summary.median - 196.5).abs() < 1e-9);
    assert!((summary.min - 196.0).abs() < 1e-9);
    assert!((summary.max - 197.0).abs() < 1e-9);
    assert!((summary.sd - 0.5).abs() < 1e-9);

    let rendered = summary.to_string();
    assert!(rendered.contains("Observations: 3"));
    assert!(rendered.contains("196.50 cm"));
}
