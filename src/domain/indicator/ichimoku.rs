//! Ichimoku Kinko Hyo.
//!
//! - Tenkan-sen: midpoint of highest high / lowest low over `tenkan` bars
//! - Kijun-sen: same over `kijun` bars
//! - Senkou Span A: (Tenkan + Kijun) / 2
//! - Senkou Span B: midpoint over `senkou_b` bars
//!
//! Spans are reported on the bar they are computed from; they are not
//! projected forward by the Kijun period.

use crate::domain::indicator_helpers::{rolling_max, rolling_min};

pub const DEFAULT_TENKAN: usize = 9;
pub const DEFAULT_KIJUN: usize = 26;
pub const DEFAULT_SENKOU_B: usize = 52;

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuLines {
    pub tenkan_sen: Vec<Option<f64>>,
    pub kijun_sen: Vec<Option<f64>>,
    pub senkou_span_a: Vec<Option<f64>>,
    pub senkou_span_b: Vec<Option<f64>>,
}

fn midpoint(high: &[f64], low: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_max(high, period)
        .into_iter()
        .zip(rolling_min(low, period))
        .map(|(hh, ll)| Some((hh? + ll?) / 2.0))
        .collect()
}

pub fn calculate_ichimoku(
    high: &[f64],
    low: &[f64],
    tenkan: usize,
    kijun: usize,
    senkou_b: usize,
) -> IchimokuLines {
    let tenkan_sen = midpoint(high, low, tenkan);
    let kijun_sen = midpoint(high, low, kijun);
    let senkou_span_a = tenkan_sen
        .iter()
        .zip(&kijun_sen)
        .map(|(t, k)| Some(((*t)? + (*k)?) / 2.0))
        .collect();
    let senkou_span_b = midpoint(high, low, senkou_b);

    IchimokuLines {
        tenkan_sen,
        kijun_sen,
        senkou_span_a,
        senkou_span_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let high = (0..n).map(|i| 10.0 + i as f64).collect();
        let low = (0..n).map(|i| i as f64).collect();
        (high, low)
    }

    #[test]
    fn ichimoku_warmups() {
        let (h, l) = ramp(60);
        let lines = calculate_ichimoku(&h, &l, DEFAULT_TENKAN, DEFAULT_KIJUN, DEFAULT_SENKOU_B);
        assert!(lines.tenkan_sen[7].is_none());
        assert!(lines.tenkan_sen[8].is_some());
        assert!(lines.kijun_sen[24].is_none());
        assert!(lines.senkou_span_a[25].is_some());
        assert!(lines.senkou_span_b[50].is_none());
        assert!(lines.senkou_span_b[51].is_some());
    }

    #[test]
    fn tenkan_is_range_midpoint() {
        let (h, l) = ramp(60);
        let lines = calculate_ichimoku(&h, &l, 9, 26, 52);
        // bar 8: highest high = 18, lowest low = 0
        assert_relative_eq!(lines.tenkan_sen[8].unwrap(), 9.0);
        // bar 30: hh = 40, ll over 26 bars = 5
        assert_relative_eq!(lines.kijun_sen[30].unwrap(), 22.5);
    }

    #[test]
    fn span_a_is_not_shifted() {
        let (h, l) = ramp(60);
        let lines = calculate_ichimoku(&h, &l, 9, 26, 52);
        let i = 40;
        let expected = (lines.tenkan_sen[i].unwrap() + lines.kijun_sen[i].unwrap()) / 2.0;
        assert_relative_eq!(lines.senkou_span_a[i].unwrap(), expected);
    }
}
