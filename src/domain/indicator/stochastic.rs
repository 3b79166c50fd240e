//! Stochastic Oscillator.
//!
//! %K = 100 * (C - LL(n)) / (HH(n) - LL(n)), undefined when HH == LL.
//! %D = SMA(%K, smooth), undefined if any %K in its window is undefined.
//!
//! Default parameters: n=5, smooth=3

use crate::domain::indicator_helpers::{rolling_defined, rolling_max, rolling_min};
use crate::domain::stats;

pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_SMOOTH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLines {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn calculate_stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    window: usize,
    smooth: usize,
) -> StochasticLines {
    let highest = rolling_max(high, window);
    let lowest = rolling_min(low, window);

    let k: Vec<Option<f64>> = close
        .iter()
        .zip(highest.iter().zip(&lowest))
        .map(|(c, (hh, ll))| {
            let (hh, ll) = ((*hh)?, (*ll)?);
            let range = hh - ll;
            (range > 0.0).then(|| 100.0 * (c - ll) / range)
        })
        .collect();
    let d = rolling_defined(&k, smooth, stats::mean);

    StochasticLines { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stochastic_warmup() {
        let high = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let low = [8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0];
        let close = [9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let lines = calculate_stochastic(&high, &low, &close, 5, 3);
        assert!(lines.k[3].is_none());
        assert!(lines.k[4].is_some());
        assert!(lines.d[5].is_none());
        assert!(lines.d[6].is_some());
    }

    #[test]
    fn stochastic_known_value() {
        let high = [10.0, 11.0, 12.0, 13.0, 14.0];
        let low = [8.0, 9.0, 10.0, 11.0, 12.0];
        let close = [9.0, 10.0, 11.0, 12.0, 13.0];
        let lines = calculate_stochastic(&high, &low, &close, 5, 3);
        // HH = 14, LL = 8 → 100 * (13 - 8) / 6
        assert_relative_eq!(lines.k[4].unwrap(), 500.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let high = [10.0, 12.0, 11.0, 14.0, 13.0, 15.0, 12.0];
        let low = [8.0, 9.0, 7.0, 10.0, 11.0, 12.0, 9.0];
        let close = [9.0, 11.0, 8.0, 13.0, 12.0, 14.0, 10.0];
        let lines = calculate_stochastic(&high, &low, &close, 5, 3);
        let expected = (lines.k[4].unwrap() + lines.k[5].unwrap() + lines.k[6].unwrap()) / 3.0;
        assert_relative_eq!(lines.d[6].unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn stochastic_zero_range_is_undefined() {
        let flat = [100.0; 8];
        let lines = calculate_stochastic(&flat, &flat, &flat, 5, 3);
        assert!(lines.k.iter().all(Option::is_none));
        assert!(lines.d.iter().all(Option::is_none));
    }
}
