// tests/result_log_tests.rs
//! Result CSV behaviour across sessions of different widths

use motion_assess::config::ReportingConfig;
use motion_assess::detection::{Metric, SessionResult, TestKind};
use motion_assess::reporting::{ResultLogConfig, ResultLogger};
use motion_assess::utils::conversion::ReportUnit;
use std::fs;
use tempfile::TempDir;

fn walking(metrics: Vec<Metric>) -> SessionResult {
    SessionResult::new(TestKind::WalkingSpeed, metrics, 200, 6_000_000_000)
}

#[test]
fn test_header_grows_to_widest_row() {
    let dir = TempDir::new().unwrap();
    let logger = ResultLogger::new(dir.path().join("wst.csv"), ResultLogConfig::default());

    logger.append(&walking(vec![Metric::duration("Time", 5.0)])).unwrap();
    logger
        .append(&walking(vec![
            Metric::duration("Time", 4.5),
            Metric::length("Distance", 5.0),
            Metric::speed("Speed", 1.11),
        ]))
        .unwrap();
    logger
        .append(&walking(vec![
            Metric::duration("Time", 6.0),
            Metric::length("Distance", 5.0),
        ]))
        .unwrap();

    let header = logger.read_header().unwrap().unwrap();
    assert_eq!(header, vec!["Time (s)", "Distance (cm)", "Speed (m/s)"]);

    let rows = logger.read_rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["5.00", "", ""]);
    assert_eq!(rows[1], vec!["4.50", "500.00", "1.11"]);
    assert_eq!(rows[2], vec!["6.00", "500.00", ""]);

    // padded fields are written, not omitted
    let raw = fs::read_to_string(logger.path()).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines[1], "5.00,,");
    assert_eq!(lines[3], "6.00,500.00,");
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let logger = ResultLogger::new(dir.path().join("wst.csv"), ResultLogConfig::default());

    logger.append(&walking(vec![Metric::duration("Time", 5.0)])).unwrap();
    logger
        .append(&walking(vec![
            Metric::duration("Time", 5.0),
            Metric::length("Distance", 5.0),
        ]))
        .unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_existing_file_is_appended() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frt.csv");
    let config = ResultLogConfig {
        unit: ReportUnit::Metres,
        precision: 2,
    };
    let result = SessionResult::new(
        TestKind::FunctionalReach,
        vec![Metric::length("Right Hand", 0.3), Metric::length("Left Hand", 0.28)],
        90,
        0,
    );

    ResultLogger::new(&path, config).append(&result).unwrap();
    // a fresh logger on the same file keeps the history
    let logger = ResultLogger::new(&path, config);
    logger.append(&result).unwrap();

    assert_eq!(logger.read_rows().unwrap().len(), 2);
    assert_eq!(
        logger.read_header().unwrap().unwrap(),
        vec!["Right Hand (m)", "Left Hand (m)"]
    );
}

#[test]
fn test_logger_from_reporting_config() {
    let dir = TempDir::new().unwrap();
    let reporting = ReportingConfig {
        results_dir: dir.path().to_path_buf(),
        decimal_precision: 1,
        ..ReportingConfig::default()
    };

    let logger = ResultLogger::for_test(TestKind::UpAndGo, &reporting);
    assert_eq!(logger.path(), dir.path().join("TUG_Test_Results.csv"));

    logger
        .append(&SessionResult::new(
            TestKind::UpAndGo,
            vec![Metric::duration("Time", 9.87), Metric::length("Distance", 3.05)],
            300,
            0,
        ))
        .unwrap();
    assert_eq!(logger.read_rows().unwrap()[0], vec!["9.9", "305.0"]);
}
