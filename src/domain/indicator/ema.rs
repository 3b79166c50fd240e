//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), EMA[0] = C[0], then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No seed-window averaging: every bar has a value.

use crate::domain::indicator_helpers::ema;

pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    ema(closes, period).into_iter().map(Some).collect()
}
