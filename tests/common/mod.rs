#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use marketlens::domain::error::MarketlensError;
pub use marketlens::domain::ohlcv::{OhlcvBar, PriceSeries, format_timestamp};
use marketlens::ports::price_source::PriceSource;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: &str,
    ) -> Result<PriceSeries, MarketlensError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MarketlensError::DataSource {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp.date() >= start && b.timestamp.date() <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(symbol, bars)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Midnight of the `i`-th day after 2024-01-01.
pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_time(NaiveTime::MIN) + chrono::Duration::days(i as i64)
}

/// Close-only bars on consecutive days.
pub fn close_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| OhlcvBar::close_only(day(i), c))
        .collect()
}

/// Oscillating OHLCV bars with a gentle drift.
pub fn generate_bars(count: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = start_price + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.05;
            OhlcvBar {
                timestamp: day(i),
                open: Some(close - 0.5),
                high: Some(close + 1.0 + (i % 3) as f64 * 0.2),
                low: Some(close - 1.0 - (i % 2) as f64 * 0.3),
                close,
                volume: Some(1000.0 + i as f64),
            }
        })
        .collect()
}

pub fn series(symbol: &str, bars: Vec<OhlcvBar>) -> PriceSeries {
    PriceSeries::new(symbol, bars).unwrap()
}

/// Writes `bars` as `<symbol>.csv` under `dir`.
pub fn write_csv(dir: &Path, symbol: &str, bars: &[OhlcvBar]) {
    let fmt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            format_timestamp(b.timestamp),
            fmt(b.open),
            fmt(b.high),
            fmt(b.low),
            b.close,
            fmt(b.volume)
        ));
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
