//! Delimited-text writers for every output table.
//!
//! Undefined values (`None`, NaN) are written as empty cells. The `date`
//! column holds a plain date for midnight stamps and a full datetime for
//! intraday bars. Writers take any `io::Write`, so callers choose between
//! files, stdout and buffers.

use crate::domain::correlation::{CorrelationMatrix, CorrelationPair};
use crate::domain::error::MarketlensError;
use crate::domain::features::FeatureRow;
use crate::domain::indicator::IndicatorSet;
use crate::domain::metrics::{GrowthCurves, InstrumentSummary, Metrics};
use crate::domain::ohlcv::format_timestamp;
use crate::domain::returns::ReturnMatrix;
use std::io::Write;

fn csv_err(e: csv::Error) -> MarketlensError {
    MarketlensError::Io(e.into())
}

fn cell(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

fn opt(v: Option<f64>) -> String {
    v.map(cell).unwrap_or_default()
}

/// Input bars followed by one column per indicator.
pub fn write_indicator_set<W: Write>(out: W, set: &IndicatorSet) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = vec!["date", "open", "high", "low", "close", "volume"];
    header.extend(set.column_names());
    wtr.write_record(&header).map_err(csv_err)?;

    for (i, bar) in set.series.bars().iter().enumerate() {
        let mut record = vec![
            format_timestamp(bar.timestamp),
            opt(bar.open),
            opt(bar.high),
            opt(bar.low),
            cell(bar.close),
            opt(bar.volume),
        ];
        record.extend(set.columns.iter().map(|c| opt(c.values[i])));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per labelled metrics record.
pub fn write_metrics<W: Write>(out: W, rows: &[(String, Metrics)]) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "name",
        "mean_daily_return",
        "volatility",
        "cumulative_return",
        "sharpe_ratio",
        "max_drawdown",
        "annualized_return",
        "annualized_volatility",
    ])
    .map_err(csv_err)?;

    for (name, m) in rows {
        wtr.write_record([
            name.clone(),
            cell(m.mean_daily_return),
            cell(m.volatility),
            cell(m.cumulative_return),
            cell(m.sharpe_ratio),
            cell(m.max_drawdown),
            cell(m.annualized_return),
            cell(m.annualized_volatility),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary<W: Write>(out: W, rows: &[InstrumentSummary]) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["symbol", "mean_return_pct", "volatility_pct", "total_return_pct"])
        .map_err(csv_err)?;
    for row in rows {
        wtr.write_record([
            row.symbol.clone(),
            opt(row.mean_return_pct),
            opt(row.volatility_pct),
            opt(row.total_return_pct),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_returns<W: Write>(out: W, returns: &ReturnMatrix) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec!["date".to_string()];
    header.extend(returns.symbols().iter().cloned());
    wtr.write_record(&header).map_err(csv_err)?;

    let columns: Vec<&[Option<f64>]> = returns.columns().map(|(_, c)| c).collect();
    for (i, ts) in returns.timestamps().iter().enumerate() {
        let mut record = vec![format_timestamp(*ts)];
        record.extend(columns.iter().map(|c| opt(c[i])));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Square matrix with a leading symbol column.
pub fn write_correlation<W: Write>(
    out: W,
    matrix: &CorrelationMatrix,
) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec![String::new()];
    header.extend(matrix.symbols().iter().cloned());
    wtr.write_record(&header).map_err(csv_err)?;

    for (symbol, row) in matrix.rows() {
        let mut record = vec![symbol.to_string()];
        record.extend(row.iter().map(|v| opt(*v)));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_pairs<W: Write>(out: W, pairs: &[CorrelationPair]) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["first", "second", "correlation"])
        .map_err(csv_err)?;
    for p in pairs {
        wtr.write_record([p.first.clone(), p.second.clone(), cell(p.value)])
            .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_features<W: Write>(out: W, rows: &[FeatureRow]) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date",
        "symbol",
        "close",
        "log_return",
        "volatility",
        "sharpe",
        "var_5",
        "es_5",
        "skew",
        "kurtosis",
        "rsi14",
        "sma20",
        "ema20",
        "bb_upper",
        "bb_lower",
        "drawdown",
    ])
    .map_err(csv_err)?;

    for r in rows {
        wtr.write_record([
            format_timestamp(r.timestamp),
            r.symbol.clone(),
            cell(r.close),
            cell(r.log_return),
            opt(r.volatility),
            opt(r.sharpe),
            opt(r.var_5),
            opt(r.es_5),
            opt(r.skew),
            opt(r.kurtosis),
            opt(r.rsi14),
            opt(r.sma20),
            opt(r.ema20),
            opt(r.bb_upper),
            opt(r.bb_lower),
            cell(r.drawdown),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Normalised instrument paths plus the portfolio path, on the price timestamps.
pub fn write_growth<W: Write>(out: W, curves: &GrowthCurves) -> Result<(), MarketlensError> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut header = vec!["date".to_string()];
    header.extend(curves.instruments.iter().map(|(s, _)| s.clone()));
    header.push("portfolio".into());
    wtr.write_record(&header).map_err(csv_err)?;

    for (i, ts) in curves.timestamps.iter().enumerate() {
        let mut record = vec![format_timestamp(*ts)];
        record.extend(curves.instruments.iter().map(|(_, path)| opt(path[i])));
        let level = curves
            .portfolio
            .iter()
            .find(|(t, _)| t == ts)
            .map(|(_, v)| *v);
        record.push(opt(level));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::correlation::compute_correlation;
    use crate::domain::indicator::{IndicatorKind, IndicatorParams, compute_indicators};
    use crate::domain::metrics::compute_metrics;
    use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
    use crate::domain::price_matrix::PriceMatrix;
    use crate::domain::returns::{ReturnSeries, compute_returns};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use std::collections::BTreeSet;

    fn day(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_time(NaiveTime::MIN)
            + chrono::Duration::days(i as i64)
    }

    fn as_text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn indicator_table_has_input_and_indicator_columns() {
        let bars = (0..3)
            .map(|i| OhlcvBar::close_only(day(i), 10.0 + i as f64))
            .collect();
        let series = PriceSeries::new("X", bars).unwrap();
        let requested: BTreeSet<_> = [IndicatorKind::Sma].into_iter().collect();
        let params = IndicatorParams {
            sma_window: 2,
            ..IndicatorParams::default()
        };
        let set = compute_indicators(&series, &requested, &params).unwrap().value;

        let mut buf = Vec::new();
        write_indicator_set(&mut buf, &set).unwrap();
        let text = as_text(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,open,high,low,close,volume,sma2");
        assert_eq!(lines[1], "2024-02-01,,,,10,,");
        assert_eq!(lines[2], "2024-02-02,,,,11,,10.5");
    }

    #[test]
    fn intraday_rows_keep_their_time() {
        let prices = PriceMatrix::from_columns(
            (0..3).map(|h| day(0) + chrono::Duration::hours(10 + h as i64)).collect(),
            vec!["A".into()],
            vec![vec![Some(1.0), Some(2.0), Some(4.0)]],
        );
        let returns = compute_returns(&prices).unwrap();

        let mut buf = Vec::new();
        write_returns(&mut buf, &returns).unwrap();
        let text = as_text(buf);
        let stamps: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(stamps, vec!["2024-02-01 11:00:00", "2024-02-01 12:00:00"]);
    }

    #[test]
    fn nan_sharpe_is_an_empty_cell() {
        let m = compute_metrics(&ReturnSeries::new(vec![day(0), day(1)], vec![0.0, 0.0])).unwrap();
        let mut buf = Vec::new();
        write_metrics(&mut buf, &[("portfolio".into(), m)]).unwrap();
        let text = as_text(buf);
        let row = text.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[0], "portfolio");
        assert_eq!(cells[4], "");
    }

    #[test]
    fn correlation_matrix_layout() {
        let prices = PriceMatrix::from_columns(
            (0..3).map(day).collect(),
            vec!["A".into(), "B".into()],
            vec![
                vec![Some(1.0), Some(2.0), Some(3.0)],
                vec![Some(3.0), Some(2.0), Some(1.5)],
            ],
        );
        let returns = compute_returns(&prices).unwrap();
        let corr = compute_correlation(&returns).value;

        let mut buf = Vec::new();
        write_correlation(&mut buf, &corr).unwrap();
        let text = as_text(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",A,B");
        assert!(lines[1].starts_with("A,"));
        assert!(lines[2].starts_with("B,"));
        assert_eq!(lines.len(), 3);

        let mut buf = Vec::new();
        write_pairs(&mut buf, &corr.most_negative(3)).unwrap();
        let text = as_text(buf);
        assert!(text.lines().nth(1).unwrap().starts_with("A,B,"));
    }
}
