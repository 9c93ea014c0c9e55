// src/reporting/csv_log.rs
//! CSV result log
//!
//! One header line followed by one row per completed session. The header
//! always describes the widest row the file has held; narrower rows are
//! padded with empty trailing fields.

use crate::config::ReportingConfig;
use crate::detection::protocol::TestKind;
use crate::detection::result::SessionResult;
use crate::utils::conversion::ReportUnit;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Formatting applied to every row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultLogConfig {
    pub unit: ReportUnit,
    pub precision: usize,
}

impl Default for ResultLogConfig {
    fn default() -> Self {
        ResultLogConfig::from(&ReportingConfig::default())
    }
}

impl From<&ReportingConfig> for ResultLogConfig {
    fn from(config: &ReportingConfig) -> Self {
        Self {
            unit: config.unit,
            precision: config.decimal_precision,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultLogger {
    path: PathBuf,
    config: ResultLogConfig,
}

impl ResultLogger {
    pub fn new(path: impl Into<PathBuf>, config: ResultLogConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Logger writing to the configured results directory for `kind`
    pub fn for_test(kind: TestKind, reporting: &ReportingConfig) -> Self {
        Self::new(reporting.results_path(kind), ResultLogConfig::from(reporting))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ResultLogConfig {
        &self.config
    }

    /// Append one session as a row, growing the header if the row is wider
    pub fn append(&self, result: &SessionResult) -> io::Result<()> {
        let scaled = result.scaled(self.config.unit);
        let titles: Vec<String> = scaled.iter().map(|m| m.column_title()).collect();
        let values: Vec<String> = scaled
            .iter()
            .map(|m| m.formatted(self.config.precision))
            .collect();

        let existing = self.read_records()?;
        match existing.split_first() {
            None => {
                self.ensure_parent_dir()?;
                let mut file = fs::File::create(&self.path)?;
                write_record(&mut file, &titles, titles.len())?;
                write_record(&mut file, &values, titles.len())?;
                debug!("Created result log {} with {} columns", self.path.display(), titles.len());
            }
            Some((header, rows)) if titles.len() > header.len() => {
                self.rewrite_with_header(&titles, rows, &values)?;
                debug!(
                    "Result log {} widened from {} to {} columns",
                    self.path.display(),
                    header.len(),
                    titles.len()
                );
            }
            Some((header, _)) => {
                let mut file = OpenOptions::new().append(true).open(&self.path)?;
                write_record(&mut file, &values, header.len())?;
            }
        }

        info!(
            "Logged {} result to {}",
            result.kind,
            self.path.display()
        );
        Ok(())
    }

    /// Header fields, `None` when nothing has been logged yet
    pub fn read_header(&self) -> io::Result<Option<Vec<String>>> {
        Ok(self.read_records()?.into_iter().next())
    }

    /// Data rows without the header
    pub fn read_rows(&self) -> io::Result<Vec<Vec<String>>> {
        Ok(self.read_records()?.into_iter().skip(1).collect())
    }

    fn read_records(&self) -> io::Result<Vec<Vec<String>>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(split_record)
            .collect())
    }

    /// Write the whole file to a sibling temp file, then move it into place
    fn rewrite_with_header(
        &self,
        header: &[String],
        rows: &[Vec<String>],
        new_row: &[String],
    ) -> io::Result<()> {
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        {
            let mut file = fs::File::create(&temp_path)?;
            write_record(&mut file, header, header.len())?;
            for row in rows {
                write_record(&mut file, row, header.len())?;
            }
            write_record(&mut file, new_row, header.len())?;
            file.flush()?;
        }

        fs::rename(&temp_path, &self.path)
    }

    fn ensure_parent_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// Write `fields` padded with empty fields up to `width`
fn write_record<W: Write>(out: &mut W, fields: &[String], width: usize) -> io::Result<()> {
    let mut line = fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>();
    line.resize(width.max(fields.len()), String::new());
    writeln!(out, "{}", line.join(","))
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::result::Metric;
    use tempfile::TempDir;

    fn reach(right: f64, left: f64) -> SessionResult {
        SessionResult::new(
            TestKind::FunctionalReach,
            vec![Metric::length("Right Hand", right), Metric::length("Left Hand", left)],
            100,
            0,
        )
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let logger = ResultLogger::new(dir.path().join("frt.csv"), ResultLogConfig::default());

        logger.append(&reach(0.4, 0.35)).unwrap();
        logger.append(&reach(0.25, 0.3)).unwrap();

        let header = logger.read_header().unwrap().unwrap();
        assert_eq!(header, vec!["Right Hand (cm)", "Left Hand (cm)"]);

        let rows = logger.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["40.00", "35.00"]);
        assert_eq!(rows[1], vec!["25.00", "30.00"]);
    }

    #[test]
    fn test_metres_and_precision() {
        let dir = TempDir::new().unwrap();
        let config = ResultLogConfig {
            unit: ReportUnit::Metres,
            precision: 3,
        };
        let logger = ResultLogger::new(dir.path().join("frt.csv"), config);
        logger.append(&reach(0.4, 0.1234)).unwrap();

        assert_eq!(
            logger.read_header().unwrap().unwrap(),
            vec!["Right Hand (m)", "Left Hand (m)"]
        );
        assert_eq!(logger.read_rows().unwrap()[0], vec!["0.400", "0.123"]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let logger = ResultLogger::new(dir.path().join("none.csv"), ResultLogConfig::default());
        assert!(logger.read_header().unwrap().is_none());
        assert!(logger.read_rows().unwrap().is_empty());
    }

    #[test]
    fn test_creates_results_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("results").join("tug.csv");
        let logger = ResultLogger::new(&path, ResultLogConfig::default());
        logger
            .append(&SessionResult::new(
                TestKind::UpAndGo,
                vec![Metric::duration("Time", 9.87)],
                10,
                0,
            ))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_quoted_fields_survive() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(split_record("\"a,b\",c"), vec!["a,b", "c"]);
        assert_eq!(split_record("x,\"say \"\"hi\"\"\","), vec!["x", "say \"hi\"", ""]);
    }
}
