//! Indicator Engine.
//!
//! This module provides:
//! - `IndicatorKind`: closed set of indicator families the engine can produce
//! - `IndicatorParams`: window sizes and constants, defaulting to the
//!   standard periods
//! - `IndicatorColumn` / `IndicatorSet`: the input series plus named output
//!   columns, one value per bar (`None` = undefined)
//! - `compute_indicators`: per-kind gating on bar count and input columns,
//!   driven by a single declarative table
//!
//! Insufficient bars or missing high/low never fail the call; the affected
//! kind is omitted and a diagnostic is returned with the set.

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod rsi;
pub mod sar;
pub mod sma;
pub mod stochastic;

use crate::domain::diagnostic::{Diagnostic, Outcome};
use crate::domain::error::MarketlensError;
use crate::domain::ohlcv::PriceSeries;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use self::adx::calculate_adx;
use self::bollinger::calculate_bollinger;
use self::ema::calculate_ema;
use self::ichimoku::calculate_ichimoku;
use self::macd::calculate_macd;
use self::rsi::calculate_rsi;
use self::sar::calculate_sar;
use self::sma::calculate_sma;
use self::stochastic::calculate_stochastic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    MaMedium,
    MaLong,
    Bollinger,
    Rsi,
    Macd,
    Sar,
    Adx,
    Ichimoku,
    Stochastic,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 11] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::MaMedium,
        IndicatorKind::MaLong,
        IndicatorKind::Bollinger,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Sar,
        IndicatorKind::Adx,
        IndicatorKind::Ichimoku,
        IndicatorKind::Stochastic,
    ];

    /// Name used in configuration and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
            IndicatorKind::MaMedium => "ma50",
            IndicatorKind::MaLong => "ma200",
            IndicatorKind::Bollinger => "bollinger",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Sar => "sar",
            IndicatorKind::Adx => "adx",
            IndicatorKind::Ichimoku => "ichimoku",
            IndicatorKind::Stochastic => "stochastic",
        }
    }

    pub fn all() -> BTreeSet<IndicatorKind> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator '{0}'")]
pub struct UnknownIndicator(pub String);

impl FromStr for IndicatorKind {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "sma" | "sma20" => IndicatorKind::Sma,
            "ema" | "ema20" => IndicatorKind::Ema,
            "ma50" => IndicatorKind::MaMedium,
            "ma200" => IndicatorKind::MaLong,
            "bollinger" | "bb" | "bollinger bands" => IndicatorKind::Bollinger,
            "rsi" | "rsi14" => IndicatorKind::Rsi,
            "macd" => IndicatorKind::Macd,
            "sar" | "psar" => IndicatorKind::Sar,
            "adx" | "atr" => IndicatorKind::Adx,
            "ichimoku" => IndicatorKind::Ichimoku,
            "stochastic" | "stoch" => IndicatorKind::Stochastic,
            other => return Err(UnknownIndicator(other.to_string())),
        };
        Ok(kind)
    }
}

/// Window sizes and constants for every indicator family.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub sma_window: usize,
    pub ema_window: usize,
    pub ma_medium: usize,
    pub ma_long: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_window: usize,
    pub sar_step: f64,
    pub sar_max_step: f64,
    pub ichimoku_tenkan: usize,
    pub ichimoku_kijun: usize,
    pub ichimoku_senkou_b: usize,
    pub stoch_window: usize,
    pub stoch_smooth: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_window: 20,
            ema_window: 20,
            ma_medium: 50,
            ma_long: 200,
            bollinger_window: 20,
            bollinger_k: 2.0,
            rsi_window: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            adx_window: 14,
            sar_step: sar::DEFAULT_STEP,
            sar_max_step: sar::DEFAULT_MAX_STEP,
            ichimoku_tenkan: ichimoku::DEFAULT_TENKAN,
            ichimoku_kijun: ichimoku::DEFAULT_KIJUN,
            ichimoku_senkou_b: ichimoku::DEFAULT_SENKOU_B,
            stoch_window: stochastic::DEFAULT_WINDOW,
            stoch_smooth: stochastic::DEFAULT_SMOOTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorColumn {
    fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// The input series, unmodified, with the indicator columns that could be
/// computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub series: PriceSeries,
    pub columns: Vec<IndicatorColumn>,
}

impl IndicatorSet {
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Inputs handed to an indicator's compute function once gating passed.
struct Inputs<'a> {
    close: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
}

type ComputeFn = fn(&Inputs<'_>, &IndicatorParams) -> Vec<IndicatorColumn>;

struct IndicatorEntry {
    min_bars: usize,
    needs_hlc: bool,
    compute: ComputeFn,
}

/// The declarative table: minimum bars, input requirements and the compute
/// function for each kind.
fn entry(kind: IndicatorKind, p: &IndicatorParams) -> IndicatorEntry {
    match kind {
        IndicatorKind::Sma => IndicatorEntry {
            min_bars: p.sma_window,
            needs_hlc: false,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    format!("sma{}", p.sma_window),
                    calculate_sma(i.close, p.sma_window),
                )]
            },
        },
        IndicatorKind::Ema => IndicatorEntry {
            min_bars: p.ema_window,
            needs_hlc: false,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    format!("ema{}", p.ema_window),
                    calculate_ema(i.close, p.ema_window),
                )]
            },
        },
        IndicatorKind::MaMedium => IndicatorEntry {
            min_bars: p.ma_medium,
            needs_hlc: false,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    format!("ma{}", p.ma_medium),
                    calculate_sma(i.close, p.ma_medium),
                )]
            },
        },
        IndicatorKind::MaLong => IndicatorEntry {
            min_bars: p.ma_long,
            needs_hlc: false,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    format!("ma{}", p.ma_long),
                    calculate_sma(i.close, p.ma_long),
                )]
            },
        },
        IndicatorKind::Bollinger => IndicatorEntry {
            min_bars: p.bollinger_window,
            needs_hlc: false,
            compute: |i, p| {
                let bands = calculate_bollinger(i.close, p.bollinger_window, p.bollinger_k);
                vec![
                    IndicatorColumn::new("bb_upper", bands.upper),
                    IndicatorColumn::new("bb_middle", bands.middle),
                    IndicatorColumn::new("bb_lower", bands.lower),
                ]
            },
        },
        IndicatorKind::Rsi => IndicatorEntry {
            min_bars: p.rsi_window,
            needs_hlc: false,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    format!("rsi{}", p.rsi_window),
                    calculate_rsi(i.close, p.rsi_window),
                )]
            },
        },
        IndicatorKind::Macd => IndicatorEntry {
            min_bars: p.macd_slow,
            needs_hlc: false,
            compute: |i, p| {
                let lines = calculate_macd(i.close, p.macd_fast, p.macd_slow, p.macd_signal);
                vec![
                    IndicatorColumn::new("macd", lines.line),
                    IndicatorColumn::new("macd_signal", lines.signal),
                ]
            },
        },
        IndicatorKind::Sar => IndicatorEntry {
            min_bars: 2,
            needs_hlc: true,
            compute: |i, p| {
                vec![IndicatorColumn::new(
                    "sar",
                    calculate_sar(i.high, i.low, p.sar_step, p.sar_max_step),
                )]
            },
        },
        IndicatorKind::Adx => IndicatorEntry {
            min_bars: p.adx_window + 1,
            needs_hlc: true,
            compute: |i, p| {
                let dmi = calculate_adx(i.high, i.low, i.close, p.adx_window);
                vec![
                    IndicatorColumn::new("adx", dmi.adx),
                    IndicatorColumn::new("+di", dmi.plus_di),
                    IndicatorColumn::new("-di", dmi.minus_di),
                    IndicatorColumn::new("atr", dmi.atr),
                ]
            },
        },
        IndicatorKind::Ichimoku => IndicatorEntry {
            min_bars: p
                .ichimoku_tenkan
                .max(p.ichimoku_kijun)
                .max(p.ichimoku_senkou_b),
            needs_hlc: true,
            compute: |i, p| {
                let lines = calculate_ichimoku(
                    i.high,
                    i.low,
                    p.ichimoku_tenkan,
                    p.ichimoku_kijun,
                    p.ichimoku_senkou_b,
                );
                vec![
                    IndicatorColumn::new("tenkan_sen", lines.tenkan_sen),
                    IndicatorColumn::new("kijun_sen", lines.kijun_sen),
                    IndicatorColumn::new("senkou_span_a", lines.senkou_span_a),
                    IndicatorColumn::new("senkou_span_b", lines.senkou_span_b),
                ]
            },
        },
        IndicatorKind::Stochastic => IndicatorEntry {
            min_bars: p.stoch_window,
            needs_hlc: true,
            compute: |i, p| {
                let lines =
                    calculate_stochastic(i.high, i.low, i.close, p.stoch_window, p.stoch_smooth);
                vec![
                    IndicatorColumn::new("stoch", lines.k),
                    IndicatorColumn::new("stoch_signal", lines.d),
                ]
            },
        },
    }
}

/// Minimum number of bars `kind` needs under `params`.
pub fn min_bars(kind: IndicatorKind, params: &IndicatorParams) -> usize {
    entry(kind, params).min_bars
}

/// Computes the requested indicators for one instrument.
///
/// Each kind is gated independently: a kind whose minimum bar count is not
/// met, or that needs high/low the series does not carry, is left out and a
/// diagnostic names it. Only an empty series is an error.
pub fn compute_indicators(
    series: &PriceSeries,
    requested: &BTreeSet<IndicatorKind>,
    params: &IndicatorParams,
) -> Result<Outcome<IndicatorSet>, MarketlensError> {
    if series.is_empty() {
        return Err(MarketlensError::EmptyInput {
            context: format!("price series {}", series.symbol()),
        });
    }

    let close = series.closes();
    let high = series.highs();
    let low = series.lows();
    let bars = series.len();

    let mut columns = Vec::new();
    let mut diagnostics = Vec::new();

    for &kind in requested {
        let entry = entry(kind, params);

        let (high, low) = match (&high, &low) {
            (Some(h), Some(l)) => (h.as_slice(), l.as_slice()),
            (h, _) if entry.needs_hlc => {
                let column = if h.is_none() { "high" } else { "low" };
                debug!(symbol = series.symbol(), indicator = %kind, column, "skipping: missing column");
                diagnostics.push(Diagnostic::missing_column(kind.name(), column));
                continue;
            }
            _ => (&[][..], &[][..]),
        };

        if bars < entry.min_bars {
            debug!(
                symbol = series.symbol(),
                indicator = %kind,
                required = entry.min_bars,
                available = bars,
                "skipping: insufficient bars"
            );
            diagnostics.push(Diagnostic::insufficient(kind.name(), entry.min_bars, bars));
            continue;
        }

        let inputs = Inputs {
            close: &close,
            high,
            low,
        };
        columns.extend((entry.compute)(&inputs, params));
    }

    Ok(Outcome::new(
        IndicatorSet {
            series: series.clone(),
            columns,
        },
        diagnostics,
    ))
}

/// Runs [`compute_indicators`] for several instruments in parallel.
///
/// Results keep the input order; one instrument's failure is confined to its
/// own entry.
pub fn compute_indicators_batch(
    series: &[PriceSeries],
    requested: &BTreeSet<IndicatorKind>,
    params: &IndicatorParams,
) -> Vec<Result<Outcome<IndicatorSet>, MarketlensError>> {
    series
        .par_iter()
        .map(|s| compute_indicators(s, requested, params))
        .collect()
}
