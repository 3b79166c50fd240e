//! OHLCV bar and single-instrument price series.
//!
//! Bars are keyed on a timestamp so daily and intraday data share one
//! representation; a daily bar sits at midnight.

use crate::domain::error::MarketlensError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a date (`2024-01-02`) or a datetime (`2024-01-02 10:30:00`; a `T`
/// separator and minute precision are accepted).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Date only for midnight stamps, full datetime otherwise.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.date().format(DATE_FORMAT).to_string()
    } else {
        ts.format(DATETIME_FORMATS[0]).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl OhlcvBar {
    /// A bar carrying only a close, as produced by close-only price tables.
    pub fn close_only(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// A raw row as delivered by a price source; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBar {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn is_empty(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.volume.is_none()
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Chronologically ordered bars for one instrument. Timestamps are unique and
/// every stored value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl PriceSeries {
    /// Sorts bars by timestamp and rejects duplicate timestamps.
    ///
    /// Bars with a non-finite close are dropped; a non-finite open, high,
    /// low or volume reads as missing.
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, MarketlensError> {
        let symbol = symbol.into();
        let mut bars: Vec<OhlcvBar> = bars
            .into_iter()
            .filter(|b| b.close.is_finite())
            .map(|b| OhlcvBar {
                open: finite(b.open),
                high: finite(b.high),
                low: finite(b.low),
                volume: finite(b.volume),
                ..b
            })
            .collect();
        bars.sort_by_key(|b| b.timestamp);
        if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(MarketlensError::DuplicateTimestamp {
                symbol,
                timestamp: pair[0].timestamp,
            });
        }
        Ok(Self { symbol, bars })
    }

    /// Builds a series from raw provider rows. Entirely empty rows are
    /// dropped, as are rows without a finite close; nothing is interpolated.
    pub fn from_rows(
        symbol: impl Into<String>,
        rows: Vec<(NaiveDateTime, RawBar)>,
    ) -> Result<Self, MarketlensError> {
        let bars = rows
            .into_iter()
            .filter(|(_, raw)| !raw.is_empty())
            .filter_map(|(timestamp, raw)| {
                finite(raw.close).map(|close| OhlcvBar {
                    timestamp,
                    open: raw.open,
                    high: raw.high,
                    low: raw.low,
                    close,
                    volume: raw.volume,
                })
            })
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// True when every bar carries both high and low.
    pub fn has_hlc(&self) -> bool {
        !self.bars.is_empty() && self.bars.iter().all(|b| b.high.is_some() && b.low.is_some())
    }

    /// High column, only when every bar carries one.
    pub fn highs(&self) -> Option<Vec<f64>> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Low column, only when every bar carries one.
    pub fn lows(&self) -> Option<Vec<f64>> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_time(NaiveTime::MIN)
    }

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            timestamp: day(15),
            open: Some(100.0),
            high: Some(110.0),
            low: Some(90.0),
            close: 105.0,
            volume: Some(50_000.0),
        }
    }

    #[test]
    fn new_sorts_by_timestamp() {
        let series = PriceSeries::new(
            "AAPL",
            vec![OhlcvBar::close_only(day(3), 3.0), OhlcvBar::close_only(day(1), 1.0)],
        )
        .unwrap();
        assert_eq!(series.timestamps(), vec![day(1), day(3)]);
        assert_eq!(series.closes(), vec![1.0, 3.0]);
    }

    #[test]
    fn new_rejects_duplicate_timestamps() {
        let result = PriceSeries::new(
            "AAPL",
            vec![OhlcvBar::close_only(day(2), 1.0), OhlcvBar::close_only(day(2), 2.0)],
        );
        assert!(matches!(
            result,
            Err(MarketlensError::DuplicateTimestamp { timestamp, .. }) if timestamp == day(2)
        ));
    }

    #[test]
    fn same_day_bars_at_different_times_are_distinct() {
        let morning = parse_timestamp("2024-01-02 10:00:00").unwrap();
        let later = parse_timestamp("2024-01-02 11:00:00").unwrap();
        let series = PriceSeries::new(
            "X",
            vec![OhlcvBar::close_only(later, 2.0), OhlcvBar::close_only(morning, 1.0)],
        )
        .unwrap();
        assert_eq!(series.timestamps(), vec![morning, later]);
    }

    #[test]
    fn non_finite_values_are_removed() {
        let mut bad_fields = sample_bar();
        bad_fields.timestamp = day(2);
        bad_fields.high = Some(f64::INFINITY);
        bad_fields.volume = Some(f64::NAN);
        let series = PriceSeries::new(
            "X",
            vec![
                OhlcvBar::close_only(day(1), f64::INFINITY),
                bad_fields,
                OhlcvBar::close_only(day(3), f64::NAN),
            ],
        )
        .unwrap();
        assert_eq!(series.timestamps(), vec![day(2)]);
        let bar = &series.bars()[0];
        assert_eq!(bar.high, None);
        assert_eq!(bar.volume, None);
        assert_eq!(bar.low, Some(90.0));
        assert!(!series.has_hlc());
    }

    #[test]
    fn from_rows_drops_empty_and_closeless_rows() {
        let rows = vec![
            (day(1), RawBar { close: Some(10.0), ..Default::default() }),
            (day(2), RawBar::default()),
            (day(3), RawBar { high: Some(12.0), ..Default::default() }),
            (day(4), RawBar { close: Some(11.0), volume: Some(5.0), ..Default::default() }),
            (day(5), RawBar { close: Some(f64::NEG_INFINITY), ..Default::default() }),
        ];
        let series = PriceSeries::from_rows("X", rows).unwrap();
        assert_eq!(series.timestamps(), vec![day(1), day(4)]);
        assert_eq!(series.bars()[1].volume, Some(5.0));
    }

    #[test]
    fn has_hlc_requires_every_bar() {
        let mut full = sample_bar();
        full.timestamp = day(1);
        let partial = OhlcvBar::close_only(day(2), 100.0);

        let ok = PriceSeries::new("A", vec![full.clone()]).unwrap();
        assert!(ok.has_hlc());
        assert!(ok.highs().is_some());

        let mixed = PriceSeries::new("A", vec![full, partial]).unwrap();
        assert!(!mixed.has_hlc());
        assert!(mixed.highs().is_none());
        assert!(mixed.lows().is_none());
    }

    #[test]
    fn empty_series_has_no_hlc() {
        let empty = PriceSeries::new("A", vec![]).unwrap();
        assert!(empty.is_empty());
        assert!(!empty.has_hlc());
    }

    #[test]
    fn timestamps_parse_dates_and_datetimes() {
        assert_eq!(parse_timestamp("2024-01-15"), Some(day(15)));
        assert_eq!(parse_timestamp(" 2024-01-15 "), Some(day(15)));
        let ts = parse_timestamp("2024-01-15T09:30:00").unwrap();
        assert_eq!(Some(ts), parse_timestamp("2024-01-15 09:30"));
        assert_eq!(ts.date(), day(15).date());
        assert!(parse_timestamp("15/01/2024").is_none());
    }

    #[test]
    fn midnight_formats_as_a_date() {
        assert_eq!(format_timestamp(day(15)), "2024-01-15");
        let ts = parse_timestamp("2024-01-15 09:30:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-15 09:30:00");
    }
}
