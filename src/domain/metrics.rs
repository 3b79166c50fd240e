//! Risk/return statistics over log-return series.

use crate::domain::error::MarketlensError;
use crate::domain::price_matrix::PriceMatrix;
use crate::domain::returns::{ReturnMatrix, ReturnSeries};
use crate::domain::stats;
use chrono::NaiveDateTime;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary of one return series.
///
/// `volatility` is NaN with fewer than two returns; `sharpe_ratio` is NaN
/// whenever volatility is zero or NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub mean_daily_return: f64,
    pub volatility: f64,
    pub cumulative_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
}

impl Metrics {
    pub fn sharpe_defined(&self) -> bool {
        !self.sharpe_ratio.is_nan()
    }
}

pub fn compute_metrics(returns: &ReturnSeries) -> Result<Metrics, MarketlensError> {
    let values = &returns.values;
    let Some(mean) = stats::mean(values) else {
        return Err(MarketlensError::EmptyInput {
            context: "return series".into(),
        });
    };

    let volatility = stats::sample_std(values).unwrap_or(f64::NAN);
    let sharpe_ratio = if volatility > 0.0 {
        mean / volatility * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        f64::NAN
    };
    let total: f64 = values.iter().sum();

    Ok(Metrics {
        mean_daily_return: mean,
        volatility,
        cumulative_return: total.exp() - 1.0,
        sharpe_ratio,
        max_drawdown: max_drawdown(values),
        annualized_return: mean * TRADING_DAYS_PER_YEAR,
        annualized_volatility: volatility * TRADING_DAYS_PER_YEAR.sqrt(),
    })
}

/// Largest drop of the cumulative log-return curve below its running peak.
fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cum = 0.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for r in returns {
        cum += r;
        peak = peak.max(cum);
        max_dd = max_dd.max(peak - cum);
    }
    max_dd
}

/// Per-instrument annualised figures, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub mean_return_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub total_return_pct: Option<f64>,
}

pub fn compute_summary(prices: &PriceMatrix, returns: &ReturnMatrix) -> Vec<InstrumentSummary> {
    prices
        .symbols()
        .iter()
        .map(|symbol| {
            let values = returns.series(symbol).unwrap_or_default().values;
            let closes = prices.valid_closes(symbol);
            let total_return_pct = match (closes.first(), closes.last()) {
                (Some((_, first)), Some((_, last))) if *first > 0.0 => {
                    Some((last / first - 1.0) * 100.0)
                }
                _ => None,
            };
            InstrumentSummary {
                symbol: symbol.clone(),
                mean_return_pct: stats::mean(&values).map(|m| m * TRADING_DAYS_PER_YEAR * 100.0),
                volatility_pct: stats::sample_std(&values)
                    .map(|s| s * TRADING_DAYS_PER_YEAR.sqrt() * 100.0),
                total_return_pct,
            }
        })
        .collect()
}

/// Normalised paths for the growth chart.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthCurves {
    pub timestamps: Vec<NaiveDateTime>,
    /// One path per instrument: price divided by its first valid price.
    pub instruments: Vec<(String, Vec<Option<f64>>)>,
    /// Compounded equal-weight portfolio path, on the portfolio's own timestamps.
    pub portfolio: Vec<(NaiveDateTime, f64)>,
}

pub fn growth_curves(prices: &PriceMatrix, portfolio: &ReturnSeries) -> GrowthCurves {
    let instruments = prices
        .columns()
        .map(|(symbol, col)| {
            let base = col.iter().flatten().copied().find(|v| *v > 0.0);
            let path = col
                .iter()
                .map(|v| Some((*v)? / base?))
                .collect();
            (symbol.to_string(), path)
        })
        .collect();

    let mut level = 1.0;
    let portfolio = portfolio
        .timestamps
        .iter()
        .zip(&portfolio.values)
        .map(|(t, r)| {
            level *= 1.0 + r;
            (*t, level)
        })
        .collect();

    GrowthCurves {
        timestamps: prices.timestamps().to_vec(),
        instruments,
        portfolio,
    }
}
