//! Numeric helpers shared by the cleaning and RQ pipelines
//!
//! Missing values are represented as NaN throughout; means skip them the
//! way column-oriented table libraries do.

/// Round to `decimals` places, ties to even (numpy's `round`).
/// NaN passes through unchanged.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(decimals);
    (x * factor).round_ties_even() / factor
}

/// Round to two decimal places
pub fn round2(x: f64) -> f64 {
    round_to(x, 2)
}

/// Mean of the non-missing values, `None` if there are none
pub fn nan_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));

    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Convert NaN/infinite to `None`
pub fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_ties_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round2(22.126), 22.13);
        assert_eq!(round2(-0.104), -0.1);
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn test_nan_mean_skips_missing() {
        assert_eq!(nan_mean([1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(nan_mean([f64::NAN, f64::NAN]), None);
        assert_eq!(nan_mean(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_finite() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(f64::INFINITY), None);
    }
}
