//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses simple trailing means of gains and losses:
//! - change[i] = C[i] - C[i-1], with change[0] = 0 (no previous close)
//! - avg_gain / avg_loss: mean of the positive / negated negative changes
//!   over the last n bars
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI is undefined (`None`), not clamped to 100.
//!
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator_helpers::rolling_mean;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for w in closes.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) if loss > 0.0 => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=16).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let rsi = calculate_rsi(&closes, 14);

        assert_eq!(rsi.len(), 16);
        for (i, v) in rsi.iter().enumerate().take(13) {
            assert!(v.is_none(), "bar {} should be undefined", i);
        }
        assert!(rsi[13].is_some(), "bar 13 should be defined");
    }

    #[test]
    fn rsi_all_gains_is_undefined_not_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi[14], None);
        assert_eq!(rsi[13], None);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_relative_eq!(rsi[14].unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_series_is_undefined() {
        let rsi = calculate_rsi(&[50.0; 20], 14);
        assert!(rsi.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_known_calculation() {
        // changes over the window: +1, -1, +2 → avg_gain = 1, avg_loss = 1/3
        let rsi = calculate_rsi(&[10.0, 11.0, 10.0, 12.0], 3);
        let rs = 1.0 / (1.0 / 3.0);
        assert_relative_eq!(rsi[3].unwrap(), 100.0 - 100.0 / (1.0 + rs), epsilon = 1e-12);
    }

    #[test]
    fn rsi_first_window_counts_zero_change_for_first_bar() {
        // window at bar 2 covers changes [0, -1, +3]
        let rsi = calculate_rsi(&[10.0, 9.0, 12.0], 3);
        let expected = 100.0 - 100.0 / (1.0 + 3.0 / 1.0);
        assert_relative_eq!(rsi[2].unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40).map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0).collect();
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }
}
