//! Report loading for the CLI
//!
//! The library API takes in-memory report sequences and performs no I/O;
//! these loaders exist for the `allostat` binary. CSV columns match the
//! `DailyReport` field names; JSON is an array of report objects.

use std::fs::File;
use std::path::Path;

use crate::error::{AllostatError, ImportError, Result};
use crate::models::DailyReport;

/// Input formats accepted by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    /// Parse a format name, or infer one from a file extension.
    pub fn resolve(explicit: Option<&str>, path: &Path) -> Result<Self> {
        let name = match explicit {
            Some(name) => name.to_lowercase(),
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase(),
        };
        match name.as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(AllostatError::Import(ImportError::UnsupportedFormat {
                format: other.to_string(),
            })),
        }
    }
}

/// Load daily reports from a file in the given format.
///
/// Records are returned in file order; the pipeline enforces the
/// chronological-ordering contract, so callers should sort before invoking
/// it if the file is unordered.
pub fn load_reports(path: &Path, format: ReportFormat) -> Result<Vec<DailyReport>> {
    match format {
        ReportFormat::Csv => load_csv(path),
        ReportFormat::Json => load_json(path),
    }
}

fn load_csv(path: &Path) -> Result<Vec<DailyReport>> {
    let mut reader = csv::Reader::from_path(path).map_err(ImportError::Csv)?;
    let mut reports = Vec::new();
    for (index, record) in reader.deserialize::<DailyReport>().enumerate() {
        let report = record.map_err(|e| {
            AllostatError::Import(ImportError::InvalidRecord {
                // header is line 1
                line: index + 2,
                reason: e.to_string(),
            })
        })?;
        reports.push(report);
    }
    Ok(reports)
}

fn load_json(path: &Path) -> Result<Vec<DailyReport>> {
    let file = File::open(path)?;
    let reports: Vec<DailyReport> =
        serde_json::from_reader(file).map_err(ImportError::Json)?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_resolution() {
        let csv_path = Path::new("reports.csv");
        assert_eq!(
            ReportFormat::resolve(None, csv_path).unwrap(),
            ReportFormat::Csv
        );
        assert_eq!(
            ReportFormat::resolve(Some("json"), csv_path).unwrap(),
            ReportFormat::Json
        );
        assert!(ReportFormat::resolve(None, Path::new("reports.xml")).is_err());
    }

    #[test]
    fn test_load_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,sleep_recovery,physical_load,recovery_from_load,psychological_stress,energy_level"
        )
        .unwrap();
        writeln!(file, "2024-03-01,7.5,4.0,6.0,3.0,7.0").unwrap();
        writeln!(file, "2024-03-02,6.0,5.5,5.0,4.5,6.0").unwrap();
        file.flush().unwrap();

        let reports = load_reports(file.path(), ReportFormat::Csv).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].sleep_recovery, 7.5);
        assert_eq!(reports[1].psychological_stress, 4.5);
    }

    #[test]
    fn test_load_csv_bad_record_reports_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,sleep_recovery,physical_load,recovery_from_load,psychological_stress,energy_level"
        )
        .unwrap();
        writeln!(file, "2024-03-01,7.5,4.0,6.0,3.0,7.0").unwrap();
        writeln!(file, "2024-03-02,seven,5.5,5.0,4.5,6.0").unwrap();
        file.flush().unwrap();

        let err = load_reports(file.path(), ReportFormat::Csv).unwrap_err();
        match err {
            AllostatError::Import(ImportError::InvalidRecord { line, .. }) => {
                assert_eq!(line, 3)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"date":"2024-03-01","sleep_recovery":7.5,"physical_load":4.0,
                "recovery_from_load":6.0,"psychological_stress":3.0,"energy_level":7.0}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let reports = load_reports(file.path(), ReportFormat::Json).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].energy_level, 7.0);
    }
}
