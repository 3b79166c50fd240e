//! CSV file price source.
//!
//! One file per instrument under a base directory: `<SYMBOL>.csv` for daily
//! data, `<SYMBOL>_<interval>.csv` for any other interval. Columns are
//! located by header name (case-insensitive); only `date` and `close` are
//! required. Dates may carry a time of day. Empty, `nan` and non-finite
//! cells read as missing.

use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::{PriceSeries, RawBar, parse_timestamp};
use crate::ports::price_source::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub const DAILY: &str = "1d";

pub struct CsvPriceSource {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        if interval == DAILY {
            self.base_path.join(format!("{}.csv", symbol))
        } else {
            self.base_path.join(format!("{}_{}.csv", symbol, interval))
        }
    }

    /// Symbols with a daily file in the base directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, MarketlensError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MarketlensError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MarketlensError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv").filter(|s| !s.contains('_')) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, MarketlensError> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let date = find(&["date", "datetime"]).ok_or_else(|| MarketlensError::DataSource {
        reason: "missing date column".into(),
    })?;
    let close = find(&["close"]).ok_or_else(|| MarketlensError::DataSource {
        reason: "missing close column".into(),
    })?;
    Ok(Columns {
        date,
        open: find(&["open"]),
        high: find(&["high"]),
        low: find(&["low"]),
        close,
        volume: find(&["volume"]),
    })
}

fn parse_cell(
    record: &csv::StringRecord,
    index: Option<usize>,
    name: &str,
) -> Result<Option<f64>, MarketlensError> {
    let Some(raw) = index.and_then(|i| record.get(i)).map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(|v| v.is_finite().then_some(v))
        .map_err(|e| MarketlensError::DataSource {
            reason: format!("invalid {} value '{}': {}", name, raw, e),
        })
}

impl PriceSource for CsvPriceSource {
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<PriceSeries, MarketlensError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path).map_err(|e| MarketlensError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| MarketlensError::DataSource {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let cols = locate_columns(&headers)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| MarketlensError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw_ts = record.get(cols.date).map(str::trim).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| MarketlensError::DataSource {
                reason: format!("invalid date '{}'", raw_ts),
            })?;

            if timestamp.date() < start || timestamp.date() > end {
                continue;
            }

            rows.push((
                timestamp,
                RawBar {
                    open: parse_cell(&record, cols.open, "open")?,
                    high: parse_cell(&record, cols.high, "high")?,
                    low: parse_cell(&record, cols.low, "low")?,
                    close: parse_cell(&record, Some(cols.close), "close")?,
                    volume: parse_cell(&record, cols.volume, "volume")?,
                },
            ));
        }

        PriceSeries::from_rows(symbol, rows)
    }
}
