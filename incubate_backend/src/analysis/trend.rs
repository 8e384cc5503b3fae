/// Ordinary least-squares slope of `values` against their index.
/// Fewer than two points have no trend.
pub fn calculate_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v)
        .sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Arithmetic mean, or `empty` when there is nothing to average.
pub(crate) fn mean_or(values: &[f64], empty: f64) -> f64 {
    if values.is_empty() {
        empty
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_has_zero_slope() {
        assert_eq!(calculate_trend(&[5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn rising_series_has_positive_slope() {
        let slope = calculate_trend(&[1.0, 2.0, 3.0, 4.0]);
        assert!((slope - 1.0).abs() < 1e-12);
        assert!(calculate_trend(&[0.9, 0.5, 0.1]) < 0.0);
    }

    #[test]
    fn short_series_has_no_trend() {
        assert_eq!(calculate_trend(&[]), 0.0);
        assert_eq!(calculate_trend(&[0.7]), 0.0);
    }

    #[test]
    fn mean_falls_back_when_empty() {
        assert_eq!(mean_or(&[], 0.5), 0.5);
        assert!((mean_or(&[0.2, 0.4], 0.5) - 0.3).abs() < 1e-12);
    }
}
