//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Both EMAs are recursive and seeded with the first close. The line is
//! reported from bar (slow - 1); the signal EMA is seeded with the first
//! reported line value and reported after `signal` line values.
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::indicator_helpers::{ema, ema_defined};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdLines {
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    let warmup = slow.max(fast).saturating_sub(1);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .enumerate()
        .map(|(i, (f, s))| (i >= warmup).then_some(f - s))
        .collect();
    let signal = ema_defined(&line, signal_period, signal_period.max(1));

    MacdLines { line, signal }
}
