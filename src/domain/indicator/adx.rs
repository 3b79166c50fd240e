//! ADX / +DI / -DI / ATR (Wilder directional movement system).
//!
//! For each bar i >= 1:
//! - up = H[i] - H[i-1], down = L[i-1] - L[i]
//! - +DM = up if up > down and up > 0, else 0; -DM symmetric
//! - TR = max(H-L, |H-C[i-1]|, |L-C[i-1]|)
//!
//! TR, +DM and -DM are Wilder-smoothed over n bars starting from bar 1:
//! the first smoothed value is the plain sum of bars 1..=n, then
//! S = S - S/n + x. +DI = 100 * S(+DM) / S(TR), -DI likewise; both are
//! undefined when S(TR) is zero.
//!
//! DX = 100 * |+DI - -DI| / (+DI + -DI); ADX seeds with the mean of the
//! first n DX values and then follows ADX = (ADX * (n-1) + DX) / n.
//!
//! Warmup: DI from bar n, ADX from bar 2n - 1. ATR is the Wilder average
//! true range from bar n - 1.

use crate::domain::indicator_helpers::{calc_atr, true_ranges};

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalIndex {
    pub adx: Vec<Option<f64>>,
    pub plus_di: Vec<Option<f64>>,
    pub minus_di: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
}

pub fn calculate_adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> DirectionalIndex {
    let len = close.len();
    let mut plus_di = vec![None; len];
    let mut minus_di = vec![None; len];
    let mut adx = vec![None; len];
    let atr = calc_atr(high, low, close, period);

    if period == 0 || len < period + 1 {
        return DirectionalIndex {
            adx,
            plus_di,
            minus_di,
            atr,
        };
    }

    let tr = true_ranges(high, low, close);
    let mut plus_dm = vec![0.0; len];
    let mut minus_dm = vec![0.0; len];
    for i in 1..len {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];
        if up_move > down_move && up_move > 0.0 {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            minus_dm[i] = down_move;
        }
    }

    let n = period as f64;
    let mut smooth_tr: f64 = tr[1..=period].iter().sum();
    let mut smooth_plus: f64 = plus_dm[1..=period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[1..=period].iter().sum();
    let mut dx: Vec<Option<f64>> = vec![None; len];

    for i in period..len {
        if i > period {
            smooth_tr = smooth_tr - smooth_tr / n + tr[i];
            smooth_plus = smooth_plus - smooth_plus / n + plus_dm[i];
            smooth_minus = smooth_minus - smooth_minus / n + minus_dm[i];
        }
        if smooth_tr <= 0.0 {
            continue;
        }
        let pdi = 100.0 * smooth_plus / smooth_tr;
        let mdi = 100.0 * smooth_minus / smooth_tr;
        plus_di[i] = Some(pdi);
        minus_di[i] = Some(mdi);

        let di_sum = pdi + mdi;
        dx[i] = Some(if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (pdi - mdi).abs() / di_sum
        });
    }

    let mut current: Option<f64> = None;
    for i in (2 * period - 1)..len {
        match current {
            None => {
                let seed: Option<Vec<f64>> = dx[i + 1 - period..=i].iter().copied().collect();
                if let Some(window) = seed {
                    current = Some(window.iter().sum::<f64>() / n);
                }
            }
            Some(prev) => match dx[i] {
                Some(d) => current = Some((prev * (n - 1.0) + d) / n),
                None => continue,
            },
        }
        adx[i] = current;
    }

    DirectionalIndex {
        adx,
        plus_di,
        minus_di,
        atr,
    }
}
