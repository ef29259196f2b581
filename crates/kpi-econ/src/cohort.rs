//! Cohort aggregation of new users and retention into daily active users.

use crate::EconError;

/// `DAU(d) = Σ_{i=1}^{d} NRU(i) * retention(d - i + 1)`.
///
/// Both inputs are day-indexed from D+1 and must have the same length.
pub fn cohort_dau(nru: &[f64], retention: &[f64]) -> Result<Vec<f64>, EconError> {
    if nru.len() != retention.len() {
        return Err(EconError::LengthMismatch {
            expected: nru.len(),
            got: retention.len(),
        });
    }
    let dau: Vec<f64> = (0..nru.len())
        .map(|d| {
            nru[..=d]
                .iter()
                .zip(retention[..=d].iter().rev())
                .map(|(n, r)| n * r)
                .sum::<f64>()
        })
        .collect();
    Ok(dau)
}

/// Maximum of the series, zero when empty.
pub fn peak(series: &[f64]) -> f64 {
    series.iter().copied().fold(0.0, f64::max)
}

/// Arithmetic mean, zero when empty.
pub fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Pushes each cohort forward through its remaining days.
    fn forward_reference(nru: &[f64], retention: &[f64]) -> Vec<f64> {
        let n = nru.len();
        let mut out = vec![0.0; n];
        for cohort in 0..n {
            for age in 0..(n - cohort) {
                out[cohort + age] += nru[cohort] * retention[age];
            }
        }
        out
    }

    fn fixture(horizon: usize) -> (Vec<f64>, Vec<f64>) {
        let nru: Vec<f64> = (1..=horizon)
            .map(|d| 10_000.0 * (d as f64).powf(-0.8) + 50.0 * (d % 7) as f64)
            .collect();
        let ret: Vec<f64> = (1..=horizon).map(|d| 0.4 * (d as f64).powf(-0.818)).collect();
        (nru, ret)
    }

    #[test]
    fn matches_forward_reference_for_reference_horizons() {
        for horizon in [1usize, 30, 365] {
            let (nru, ret) = fixture(horizon);
            let fast = cohort_dau(&nru, &ret).unwrap();
            let slow = forward_reference(&nru, &ret);
            assert_eq!(fast.len(), horizon);
            for (a, b) in fast.iter().zip(&slow) {
                assert!((a - b).abs() <= 1e-6 * b.abs().max(1e-12));
            }
        }
    }

    #[test]
    fn single_cohort_decays_with_retention() {
        let nru = [100.0, 0.0, 0.0];
        let ret = [0.5, 0.25, 0.125];
        assert_eq!(cohort_dau(&nru, &ret).unwrap(), vec![50.0, 25.0, 12.5]);
    }

    #[test]
    fn length_mismatch_rejected() {
        assert_eq!(
            cohort_dau(&[1.0, 2.0], &[1.0]),
            Err(EconError::LengthMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn peak_and_mean() {
        assert_eq!(peak(&[1.0, 5.0, 3.0]), 5.0);
        assert_eq!(mean(&[1.0, 5.0, 3.0]), 3.0);
        assert_eq!(mean(&[]), 0.0);
    }

    proptest! {
        #[test]
        fn convolution_matches_reference(
            nru in proptest::collection::vec(0.0f64..1e6, 1..120),
            r1 in 0.05f64..1.0,
        ) {
            let ret: Vec<f64> = (1..=nru.len()).map(|d| r1 * (d as f64).powf(-0.6)).collect();
            let fast = cohort_dau(&nru, &ret).unwrap();
            let slow = forward_reference(&nru, &ret);
            for (a, b) in fast.iter().zip(&slow) {
                prop_assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0));
            }
        }
    }
}
