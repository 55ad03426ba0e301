/// Numerically stable `log(sum(exp(xs))`
///
/// Returns `NEG_INFINITY` for an empty slice or when every entry is
/// `NEG_INFINITY`. Any `NaN` entry makes the result `NaN`.
#[inline]
pub fn logsumexp(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NEG_INFINITY;
    } else if xs.len() == 1 {
        return xs[0];
    }

    if xs.iter().any(|x| x.is_nan()) {
        return f64::NAN;
    }

    let maxval = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if maxval.is_infinite() {
        // all -inf, or at least one +inf
        return maxval;
    }

    xs.iter()
        .fold(0.0_f64, |acc, x| acc + (x - maxval).exp())
        .ln()
        + maxval
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn logsumexp_on_vector_of_zeros() {
        let xs: Vec<f64> = vec![0.0; 5];
        // should be about log(5)
        assert_relative_eq!(
            logsumexp(&xs),
            1.609_437_912_434_100_3,
            epsilon = 1E-12
        );
    }

    #[test]
    fn logsumexp_on_random_values() {
        let xs: Vec<f64> = vec![
            0.304_153_86,
            -0.070_722_96,
            -1.042_870_34,
            0.278_554_4,
            -0.818_967_65,
        ];
        let expected: f64 = xs.iter().map(|x| x.exp()).sum::<f64>().ln();
        assert_relative_eq!(logsumexp(&xs), expected, epsilon = 1E-12);
    }

    #[test]
    fn logsumexp_does_not_overflow() {
        let xs: Vec<f64> = vec![1000.0, 1000.0];
        assert_relative_eq!(
            logsumexp(&xs),
            1000.0 + 2.0_f64.ln(),
            epsilon = 1E-10
        );
    }

    #[test]
    fn logsumexp_returns_only_value_on_one_element_container() {
        let xs: Vec<f64> = vec![0.304_153_86];
        assert_relative_eq!(logsumexp(&xs), 0.304_153_86, epsilon = 1E-12);
    }

    #[test]
    fn logsumexp_of_empty_and_all_neg_inf() {
        assert_eq!(logsumexp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            logsumexp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn logsumexp_propagates_nan() {
        assert!(logsumexp(&[0.0, f64::NAN, 1.0]).is_nan());
    }
}
