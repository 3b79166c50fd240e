//! Rolling feature table for downstream modelling.
//!
//! Each instrument is processed on its own valid closes. Rolling statistics
//! are taken over the last `window` log returns and are `None` until the
//! window is full (or when the statistic is undefined for it). RSI, SMA, EMA
//! and Bollinger use their standard 14/20-bar periods regardless of `window`.

use crate::domain::diagnostic::{Diagnostic, Outcome};
use crate::domain::error::MarketlensError;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator_helpers::rolling_defined;
use crate::domain::metrics::TRADING_DAYS_PER_YEAR;
use crate::domain::price_matrix::PriceMatrix;
use crate::domain::stats;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use tracing::debug;

pub const DEFAULT_WINDOW: usize = 20;
pub const TAIL_QUANTILE: f64 = 0.05;

const RSI_PERIOD: usize = 14;
const MA_PERIOD: usize = 20;
const BOLLINGER_K: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub close: f64,
    pub log_return: f64,
    /// Annualised rolling volatility.
    pub volatility: Option<f64>,
    /// Annualised rolling Sharpe ratio.
    pub sharpe: Option<f64>,
    pub var_5: Option<f64>,
    pub es_5: Option<f64>,
    pub skew: Option<f64>,
    pub kurtosis: Option<f64>,
    pub rsi14: Option<f64>,
    pub sma20: Option<f64>,
    pub ema20: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    /// Fractional distance below the running peak close (zero or negative).
    pub drawdown: f64,
}

/// Minimum valid closes an instrument needs to appear in the feature table.
pub fn min_closes(window: usize) -> usize {
    window + 2
}

/// Builds the feature table for every instrument in `prices`.
///
/// Instruments with fewer than `window + 2` valid closes are left out, each
/// with a diagnostic; an extra diagnostic is added when that leaves nothing.
/// Rows are unique per (symbol, timestamp) and sorted by symbol, then time.
pub fn extract_features(
    prices: &PriceMatrix,
    window: usize,
) -> Result<Outcome<Vec<FeatureRow>>, MarketlensError> {
    if prices.is_empty() {
        return Err(MarketlensError::EmptyInput {
            context: "price matrix".into(),
        });
    }

    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();
    let mut seen = BTreeSet::new();
    let required = min_closes(window);

    for symbol in prices.symbols() {
        if !seen.insert(symbol.as_str()) {
            continue;
        }
        let closes = prices.valid_closes(symbol);
        if closes.len() < required {
            debug!(%symbol, available = closes.len(), required, "excluded from features");
            diagnostics.push(Diagnostic::insufficient(symbol.as_str(), required, closes.len()));
            continue;
        }
        rows.extend(symbol_features(symbol, &closes, window));
    }

    if rows.is_empty() && !seen.is_empty() && diagnostics.len() == seen.len() {
        diagnostics.push(Diagnostic::all_excluded("features"));
    }

    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.timestamp.cmp(&b.timestamp)));
    rows.dedup_by(|a, b| a.symbol == b.symbol && a.timestamp == b.timestamp);

    Ok(Outcome::new(rows, diagnostics))
}

fn symbol_features(
    symbol: &str,
    points: &[(NaiveDateTime, f64)],
    window: usize,
) -> Vec<FeatureRow> {
    let closes: Vec<f64> = points.iter().map(|(_, c)| *c).collect();

    let mut log_returns = vec![None; closes.len()];
    for i in 1..closes.len() {
        let (prev, curr) = (closes[i - 1], closes[i]);
        if prev > 0.0 && curr > 0.0 {
            log_returns[i] = Some((curr / prev).ln()).filter(|r| r.is_finite());
        }
    }

    let annual = TRADING_DAYS_PER_YEAR.sqrt();
    let volatility = rolling_defined(&log_returns, window, |w| {
        stats::sample_std(w).map(|s| s * annual)
    });
    let sharpe = rolling_defined(&log_returns, window, |w| {
        let sd = stats::sample_std(w).filter(|sd| *sd > 0.0)?;
        Some(stats::mean(w)? / sd * annual)
    });
    let var_5 = rolling_defined(&log_returns, window, |w| stats::quantile(w, TAIL_QUANTILE));
    let es_5 = rolling_defined(&log_returns, window, |w| {
        stats::expected_shortfall(w, TAIL_QUANTILE)
    });
    let skew = rolling_defined(&log_returns, window, stats::skewness);
    let kurtosis = rolling_defined(&log_returns, window, stats::excess_kurtosis);

    let rsi14 = calculate_rsi(&closes, RSI_PERIOD);
    let sma20 = calculate_sma(&closes, MA_PERIOD);
    let ema20 = calculate_ema(&closes, MA_PERIOD);
    let bands = calculate_bollinger(&closes, MA_PERIOD, BOLLINGER_K);

    let mut peak = f64::NEG_INFINITY;
    let mut rows = Vec::with_capacity(closes.len().saturating_sub(1));
    for (i, &(timestamp, close)) in points.iter().enumerate() {
        peak = peak.max(close);
        let Some(log_return) = log_returns[i] else {
            continue;
        };
        let drawdown = if peak > 0.0 { (close - peak) / peak } else { 0.0 };
        rows.push(FeatureRow {
            timestamp,
            symbol: symbol.to_string(),
            close,
            log_return,
            volatility: volatility[i],
            sharpe: sharpe[i],
            var_5: var_5[i],
            es_5: es_5[i],
            skew: skew[i],
            kurtosis: kurtosis[i],
            rsi14: rsi14[i],
            sma20: sma20[i],
            ema20: ema20[i],
            bb_upper: bands.upper[i],
            bb_lower: bands.lower[i],
            drawdown,
        });
    }
    rows
}
