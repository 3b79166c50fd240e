//! Sample statistics over plain slices.
//!
//! All estimators use the unbiased (n - 1) conventions of the rolling
//! statistics they back. Functions return `None` when the statistic is
//! undefined for the given sample.

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample variance (divides by n - 1).
pub fn sample_variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let ss: f64 = xs.iter().map(|x| (x - m) * (x - m)).sum();
    Some(ss / (xs.len() - 1) as f64)
}

pub fn sample_std(xs: &[f64]) -> Option<f64> {
    sample_variance(xs).map(f64::sqrt)
}

/// Empirical quantile with linear interpolation between order statistics.
pub fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean of the observations at or below the `q` quantile.
pub fn expected_shortfall(xs: &[f64], q: f64) -> Option<f64> {
    let cutoff = quantile(xs, q)?;
    let tail: Vec<f64> = xs.iter().copied().filter(|&x| x <= cutoff).collect();
    mean(&tail)
}

/// Second central moment too small relative to the mean to divide by.
fn negligible_spread(m2: f64, m: f64) -> bool {
    m2 <= (1e-12 * m).powi(2)
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson, G1).
pub fn skewness(xs: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 3 {
        return None;
    }
    let m = mean(xs)?;
    let nf = n as f64;
    let m2: f64 = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / nf;
    if negligible_spread(m2, m) {
        return None;
    }
    let m3: f64 = xs.iter().map(|x| (x - m).powi(3)).sum::<f64>() / nf;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
}

/// Bias-corrected sample excess kurtosis (G2).
pub fn excess_kurtosis(xs: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 4 {
        return None;
    }
    let m = mean(xs)?;
    let nf = n as f64;
    let m2: f64 = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / nf;
    if negligible_spread(m2, m) {
        return None;
    }
    let m4: f64 = xs.iter().map(|x| (x - m).powi(4)).sum::<f64>() / nf;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
}

/// Pearson correlation over paired observations.
///
/// `None` when fewer than two pairs exist or either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_std() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&xs).unwrap(), 5.0);
        // population std is 2, sample variance = 32/7
        assert_relative_eq!(sample_variance(&xs).unwrap(), 32.0 / 7.0, epsilon = 1e-12);
        assert!(sample_std(&[1.0]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn quantile_interpolates() {
        let xs = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_relative_eq!(quantile(&xs, 0.5).unwrap(), 3.0);
        assert_relative_eq!(quantile(&xs, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile(&xs, 1.0).unwrap(), 5.0);
        // pos = 0.05 * 4 = 0.2 → 1 + 0.2 * (2 - 1)
        assert_relative_eq!(quantile(&xs, 0.05).unwrap(), 1.2, epsilon = 1e-12);
        assert!(quantile(&xs, 1.5).is_none());
    }

    #[test]
    fn expected_shortfall_averages_tail() {
        let xs = [-0.05, -0.01, 0.0, 0.01, 0.02];
        // 5% quantile = -0.05 + 0.2 * 0.04 = -0.042, only -0.05 is at or below it
        assert_relative_eq!(expected_shortfall(&xs, 0.05).unwrap(), -0.05);
        assert!(expected_shortfall(&[], 0.05).is_none());
    }

    #[test]
    fn skewness_of_symmetric_sample_is_zero() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(skewness(&xs).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn skewness_right_tail_positive() {
        let xs = [1.0, 1.0, 1.0, 2.0, 10.0];
        assert!(skewness(&xs).unwrap() > 0.0);
    }

    #[test]
    fn kurtosis_known_value() {
        // Uniform 1..=5: bias-corrected excess kurtosis is -1.2
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(excess_kurtosis(&xs).unwrap(), -1.2, epsilon = 1e-12);
    }

    #[test]
    fn higher_moments_undefined_for_constant_sample() {
        let xs = [3.0; 10];
        assert!(skewness(&xs).is_none());
        assert!(excess_kurtosis(&xs).is_none());
    }

    #[test]
    fn pearson_perfect_and_degenerate() {
        let up: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        assert_relative_eq!(pearson(&up).unwrap(), 1.0, epsilon = 1e-12);

        let down: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, -(i as f64))).collect();
        assert_relative_eq!(pearson(&down).unwrap(), -1.0, epsilon = 1e-12);

        let flat: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 7.0)).collect();
        assert!(pearson(&flat).is_none());
        assert!(pearson(&[(1.0, 2.0)]).is_none());
    }
}
