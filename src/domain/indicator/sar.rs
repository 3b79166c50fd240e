//! Parabolic SAR (stop and reverse).
//!
//! Trend starts long when H[1] > H[0]. Each bar:
//! SAR = prev_SAR + AF * (EP - prev_SAR), clamped so it never sits inside
//! the previous two bars' range. When price crosses the SAR the trend
//! reverses: SAR jumps to the extreme point, EP resets to the current bar's
//! extreme and AF resets to `step`. AF grows by `step` on every new extreme,
//! capped at `max_step`.

pub const DEFAULT_STEP: f64 = 0.02;
pub const DEFAULT_MAX_STEP: f64 = 0.2;

pub fn calculate_sar(high: &[f64], low: &[f64], step: f64, max_step: f64) -> Vec<Option<f64>> {
    let len = high.len();
    let mut result = vec![None; len];
    if len < 2 {
        return result;
    }

    let mut is_long = high[1] > high[0];
    let mut af = step;
    let mut ep = if is_long { high[0] } else { low[0] };
    let mut sar = if is_long { low[0] } else { high[0] };
    result[0] = Some(sar);

    for i in 1..len {
        sar += af * (ep - sar);

        if is_long {
            sar = sar.min(low[i - 1]);
            if i >= 2 {
                sar = sar.min(low[i - 2]);
            }
            if low[i] < sar {
                is_long = false;
                sar = ep;
                ep = low[i];
                af = step;
            } else if high[i] > ep {
                ep = high[i];
                af = (af + step).min(max_step);
            }
        } else {
            sar = sar.max(high[i - 1]);
            if i >= 2 {
                sar = sar.max(high[i - 2]);
            }
            if high[i] > sar {
                is_long = true;
                sar = ep;
                ep = high[i];
                af = step;
            } else if low[i] < ep {
                ep = low[i];
                af = (af + step).min(max_step);
            }
        }

        result[i] = Some(sar);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sar_needs_two_bars() {
        assert_eq!(calculate_sar(&[10.0], &[9.0], DEFAULT_STEP, DEFAULT_MAX_STEP), vec![None]);
    }

    #[test]
    fn sar_two_bars_defined() {
        let sar = calculate_sar(&[10.0, 11.0], &[9.0, 10.0], DEFAULT_STEP, DEFAULT_MAX_STEP);
        assert_relative_eq!(sar[0].unwrap(), 9.0);
        // 9 + 0.02 * (10 - 9), clamped to low[0] = 9
        assert_relative_eq!(sar[1].unwrap(), 9.0);
    }

    #[test]
    fn sar_stays_below_price_in_uptrend() {
        let high: Vec<f64> = (0..30).map(|i| 101.0 + i as f64).collect();
        let low: Vec<f64> = (0..30).map(|i| 99.0 + i as f64).collect();
        let sar = calculate_sar(&high, &low, DEFAULT_STEP, DEFAULT_MAX_STEP);
        for i in 0..30 {
            assert!(sar[i].unwrap() <= low[i]);
        }
    }

    #[test]
    fn sar_reverses_on_breakdown() {
        let mut high: Vec<f64> = (0..10).map(|i| 101.0 + i as f64).collect();
        let mut low: Vec<f64> = (0..10).map(|i| 99.0 + i as f64).collect();
        // crash far below the rising stop
        high.push(90.0);
        low.push(80.0);
        let sar = calculate_sar(&high, &low, DEFAULT_STEP, DEFAULT_MAX_STEP);
        // after reversal the stop sits at the prior extreme high
        assert_relative_eq!(sar[10].unwrap(), 110.0);
        assert!(sar[10].unwrap() > high[10]);
    }

    #[test]
    fn sar_acceleration_capped() {
        let high: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 2.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 1.0).collect();
        let sar = calculate_sar(&high, &low, DEFAULT_STEP, DEFAULT_MAX_STEP);
        // with AF capped at 0.2 the stop trails the extreme by a bounded gap
        let gap = high[99] - sar[99].unwrap();
        assert!(gap > 0.0 && gap.is_finite());
    }
}
