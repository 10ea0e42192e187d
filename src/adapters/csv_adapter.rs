//! CSV file data adapter.
//!
//! Reads `<base>/<SYMBOL>.csv` with header `date,open,high,low,close,volume`.
//! Dates are either plain `YYYY-MM-DD` or timestamps with an offset
//! (RFC 3339 or `YYYY-MM-DD HH:MM:SS+HH:MM`); a file must use one kind
//! throughout. The first timestamp's offset becomes the series timezone.

use crate::domain::error::VotecastError;
use crate::domain::ohlcv::PricePoint;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

enum RowDate {
    Naive(NaiveDate),
    Zoned(DateTime<FixedOffset>),
}

fn parse_row_date(value: &str) -> Option<RowDate> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(RowDate::Naive(d));
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z"))
        .ok()
        .map(RowDate::Zoned)
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, VotecastError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VotecastError::NoData {
                symbol: symbol.to_string(),
            },
            _ => VotecastError::Io(e),
        })?;

        let format_err = |reason: String| VotecastError::DataFormat {
            symbol: symbol.to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();
        let mut timezone: Option<Option<FixedOffset>> = None;

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| format_err(format!("CSV parse error: {}", e)))?;
            let row = line + 2;

            let date_str = record
                .get(0)
                .ok_or_else(|| format_err(format!("row {}: missing date column", row)))?;
            let (date, offset) = match parse_row_date(date_str) {
                Some(RowDate::Naive(d)) => (d, None),
                Some(RowDate::Zoned(dt)) => (dt.date_naive(), Some(*dt.offset())),
                None => {
                    return Err(format_err(format!(
                        "row {}: invalid date '{}'",
                        row, date_str
                    )));
                }
            };
            match timezone {
                None => timezone = Some(offset),
                Some(tz) if tz.is_some() != offset.is_some() => {
                    return Err(format_err(format!(
                        "row {}: mixes plain dates and timestamps",
                        row
                    )));
                }
                Some(_) => {}
            }

            let column = |idx: usize, name: &str| -> Result<f64, VotecastError> {
                record
                    .get(idx)
                    .ok_or_else(|| format_err(format!("row {}: missing {} column", row, name)))?
                    .trim()
                    .parse()
                    .map_err(|e| format_err(format!("row {}: invalid {} value: {}", row, name, e)))
            };

            points.push(PricePoint {
                date,
                open: column(1, "open")?,
                high: column(2, "high")?,
                low: column(3, "low")?,
                close: column(4, "close")?,
                volume: column(5, "volume")?,
            });
        }

        if points.is_empty() {
            return Err(VotecastError::NoData {
                symbol: symbol.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(format_err(format!("duplicate date {}", pair[0].date)));
        }
        PriceSeries::new(symbol, points, timezone.flatten())
    }

    fn list_symbols(&self) -> Result<Vec<String>, VotecastError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";
        fs::write(path.join("SPY.csv"), csv_content).unwrap();

        let zoned = "date,open,high,low,close,volume\n\
            2024-01-15 00:00:00-05:00,20.0,21.0,19.0,20.5,0\n\
            2024-01-16T00:00:00-05:00,20.5,22.0,20.0,21.5,0\n";
        fs::write(path.join("VIX.csv"), zoned).unwrap();

        fs::write(path.join("EMPTY.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_series_sorts_rows() {
        let (_dir, path) = setup_test_data();
        let series = CsvAdapter::new(path).fetch_series("SPY").unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.timezone(), None);
        let p = &series.points()[0];
        assert_eq!(p.date, d(2024, 1, 15));
        assert_eq!(p.open, 100.0);
        assert_eq!(p.high, 110.0);
        assert_eq!(p.low, 90.0);
        assert_eq!(p.close, 105.0);
        assert_eq!(p.volume, 50000.0);
        assert_eq!(series.last_date(), Some(d(2024, 1, 17)));
    }

    #[test]
    fn zoned_timestamps_set_timezone() {
        let (_dir, path) = setup_test_data();
        let series = CsvAdapter::new(path).fetch_series("VIX").unwrap();
        assert_eq!(series.timezone(), FixedOffset::west_opt(5 * 3600));
        assert_eq!(series.first_date(), Some(d(2024, 1, 15)));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let err = CsvAdapter::new(path).fetch_series("XYZ").unwrap_err();
        assert!(matches!(err, VotecastError::NoData { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn header_only_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let err = CsvAdapter::new(path).fetch_series("EMPTY").unwrap_err();
        assert!(matches!(err, VotecastError::NoData { .. }));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("DUP.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,1\n2024-01-15,2,2,2,2,2\n",
        )
        .unwrap();
        let err = CsvAdapter::new(path).fetch_series("DUP").unwrap_err();
        assert!(matches!(err, VotecastError::DataFormat { reason, .. } if reason.contains("duplicate")));
    }

    #[test]
    fn bad_number_reports_row() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,abc,1\n",
        )
        .unwrap();
        let err = CsvAdapter::new(path).fetch_series("BAD").unwrap_err();
        assert!(matches!(err, VotecastError::DataFormat { reason, .. } if reason.starts_with("row 2")));
    }

    #[test]
    fn mixed_date_kinds_rejected() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("MIX.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,1,1\n2024-01-16T00:00:00Z,1,1,1,1,1\n",
        )
        .unwrap();
        assert!(CsvAdapter::new(path).fetch_series("MIX").is_err());
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let symbols = CsvAdapter::new(path).list_symbols().unwrap();
        assert_eq!(symbols, vec!["EMPTY", "SPY", "VIX"]);
    }
}
