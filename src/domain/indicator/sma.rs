//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.
//! Also backs the medium/long trend averages (MA50, MA200).

use crate::domain::indicator_helpers::rolling_mean;

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_mean(closes, period)
}
