use chrono::{DateTime, TimeZone, Utc};

const TOLERANCE: f64 = 1e-4;

pub(crate) trait TestHelper<Rhs> {
    fn assert_approx_eq(&self, expected: Rhs);
}

impl TestHelper<f64> for f64 {
    fn assert_approx_eq(&self, expected: f64) {
        assert!(
            (self - expected).abs() < TOLERANCE,
            "{self} is not approximately {expected}"
        );
    }
}

impl<const N: usize> TestHelper<[f64; N]> for [f64] {
    fn assert_approx_eq(&self, expected: [f64; N]) {
        assert_eq!(self.len(), N, "{self:?} has the wrong length");
        for (actual, expected) in self.iter().zip(expected) {
            assert!(
                (actual - expected).abs() < TOLERANCE,
                "{self:?} is not approximately {expected:?}"
            );
        }
    }
}

impl<const N: usize> TestHelper<[f64; N]> for Vec<f64> {
    fn assert_approx_eq(&self, expected: [f64; N]) {
        self.as_slice().assert_approx_eq(expected)
    }
}

/// 2024-03-01 08:00:00 UTC, so tests never depend on the wall clock.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}
