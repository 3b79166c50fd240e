//! Shared rolling-window primitives for indicator calculations.
//!
//! Every helper returns one entry per input value; `None` marks warm-up
//! positions or windows where the statistic is undefined.

use crate::domain::stats;

/// Trailing simple mean over `period` values.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, stats::mean)
}

/// Trailing sample standard deviation over `period` values.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, stats::sample_std)
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::max))
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::min))
}

/// Applies `f` to each full trailing window of `period` values.
pub fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                f(&values[i + 1 - period..=i])
            }
        })
        .collect()
}

/// Like [`rolling`], over a series with gaps: a window is evaluated only when
/// all of its `period` entries are defined.
pub fn rolling_defined<F>(values: &[Option<f64>], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if period == 0 {
        return vec![None; values.len()];
    }
    let mut window = Vec::with_capacity(period);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            window.clear();
            for v in &values[i + 1 - period..=i] {
                window.push((*v)?);
            }
            f(&window)
        })
        .collect()
}

/// Recursive exponential moving average with decay `2 / (span + 1)`.
///
/// Seeded with the first value: `e[0] = x[0]`, `e[t] = a*x[t] + (1-a)*e[t-1]`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return values.to_vec();
    }
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let e = match prev {
            None => x,
            Some(p) => x * k + p * (1.0 - k),
        };
        out.push(e);
        prev = Some(e);
    }
    out
}

/// Recursive EMA over a series with leading gaps, reported once at least
/// `min_periods` defined values have been observed.
pub fn ema_defined(values: &[Option<f64>], span: usize, min_periods: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut seen = 0usize;
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            seen += 1;
            let e = match prev {
                None => x,
                Some(p) => x * k + p * (1.0 - k),
            };
            prev = Some(e);
            (seen >= min_periods).then_some(e)
        })
        .collect()
}

/// Per-bar true range; the first bar has no previous close and uses high - low.
pub fn true_ranges(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..close.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            }
        })
        .collect()
}

/// Average true range: seeded with the mean of the first `period` true
/// ranges, then Wilder smoothing `atr = (prev * (n-1) + tr) / n`.
pub fn calc_atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = close.len();
    let mut results = vec![None; len];
    if len < period || period == 0 {
        return results;
    }

    let tr = true_ranges(high, low, close);
    let mut atr = tr[..period].iter().sum::<f64>() / period as f64;
    results[period - 1] = Some(atr);
    for i in period..len {
        atr = (atr * (period - 1) as f64 + tr[i]) / period as f64;
        results[i] = Some(atr);
    }
    results
}
