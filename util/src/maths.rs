//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp a value between a minimum and a maximum.
///
/// NaN values are passed through unchanged, callers which can produce NaN shall handle it before
/// clamping.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle in degrees into the range [0, 360).
pub fn wrap_deg<T>(angle: T) -> T
where
    T: Float,
{
    let full_turn = T::from(360.0).unwrap_or_else(T::zero);
    let wrapped = rem_euclid(angle, full_turn);

    // Round-off can give exactly 360
    if wrapped >= full_turn {
        T::zero()
    } else {
        wrapped
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0.0, 100.0), (0.0, 1.0), 50.0), 0.5);
        assert_eq!(lin_map((0.0, 179.0), (0.0, 358.0), 90.0), 180.0);
        assert_eq!(lin_map((-1.0, 1.0), (10.0, 20.0), -1.0), 10.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-7.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25, &-1.0, &1.0), 0.25);
    }

    #[test]
    fn test_wrap_deg() {
        assert_eq!(wrap_deg(0.0), 0.0);
        assert_eq!(wrap_deg(360.0), 0.0);
        assert_eq!(wrap_deg(-10.0), 350.0);
        assert_eq!(wrap_deg(725.0), 5.0);
        assert_eq!(wrap_deg(-1e-20), 0.0);
    }
}
