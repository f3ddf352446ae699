//! Bounded random deviations.
//!
//! Every jittered quantity in the pipeline (baseline offsets, ruler
//! position, circle radius, tile rotation angle) is a symmetric
//! perturbation around a base value. These helpers draw that
//! perturbation from a caller-supplied RNG so seeded runs are
//! reproducible.

use rand::Rng;

/// Uniform integer in `[-range, range]`.
///
/// A zero range returns zero without consuming randomness.
pub fn deviate<R: Rng + ?Sized>(rng: &mut R, range: u32) -> i32 {
    if range == 0 {
        return 0;
    }
    let bound = i64::from(range);
    let value = rng.random_range(-bound..=bound);
    // |value| <= u32::MAX; saturate rather than wrap on absurd ranges.
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Uniform float in `[-range, range]`.
///
/// Zero, negative and non-finite ranges return `0.0` without consuming
/// randomness.
pub fn deviate_f64<R: Rng + ?Sized>(rng: &mut R, range: f64) -> f64 {
    if !range.is_finite() || range <= 0.0 {
        return 0.0;
    }
    rng.random_range(-range..=range)
}

/// Random angle in radians, uniform in `[-degrees, degrees]` degrees.
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R, degrees: f64) -> f64 {
    deviate_f64(rng, degrees).to_radians()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn zero_range_is_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(deviate(&mut rng, 0), 0);
            assert!(deviate_f64(&mut rng, 0.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn zero_range_consumes_no_randomness() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let _ = deviate(&mut a, 0);
        let _ = deviate_f64(&mut a, 0.0);
        assert_eq!(deviate(&mut a, 10), deviate(&mut b, 10));
    }

    #[test]
    fn integer_deviation_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let v = deviate(&mut rng, 8);
            assert!((-8..=8).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn integer_deviation_reaches_both_extremes() {
        let mut rng = StdRng::seed_from_u64(2);
        let samples: Vec<i32> = (0..10_000).map(|_| deviate(&mut rng, 3)).collect();
        assert!(samples.contains(&-3));
        assert!(samples.contains(&3));
    }

    #[test]
    fn float_deviation_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10_000 {
            let v = deviate_f64(&mut rng, 5.0);
            assert!((-5.0..=5.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn negative_and_nan_ranges_are_zero() {
        let mut rng = StdRng::seed_from_u64(4);
        assert!(deviate_f64(&mut rng, -1.0).abs() < f64::EPSILON);
        assert!(deviate_f64(&mut rng, f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn random_angle_is_radians() {
        let mut rng = StdRng::seed_from_u64(5);
        let limit = 5.0_f64.to_radians();
        for _ in 0..1_000 {
            let a = random_angle(&mut rng, 5.0);
            assert!(a.abs() <= limit + 1e-12, "angle {a} exceeds {limit}");
        }
    }
}
