//! Fade curve shaping.
//!
//! A fade advances a linear position `x` from 0 to 1 and maps it through
//! [`fade_shape`] to get the gain. The profile morphs the shape:
//!
//! | profile | shape |
//! |---------|-------|
//! | `+1.0`  | exponential (`x³`, slow start) |
//! | `0.0`   | linear |
//! | `-1.0`  | logarithmic (`1 - (1 - x)³`, fast start) |
//!
//! Intermediate profiles blend linearly between linear and the end shape.

use crate::math::lerp;

/// Bisection steps used by [`fade_shape_inverse`]. 24 halvings resolve
/// `x` to below one `f32` ulp at 1.0.
const INVERSE_ITERATIONS: usize = 24;

/// Map a fade position `x` in `[0, 1]` to a gain in `[0, 1]`.
///
/// `profile` is clamped to `[-1, 1]`; `x` is clamped to `[0, 1]`. The shape
/// is monotonically non-decreasing and passes through `(0, 0)` and `(1, 1)`
/// for every profile.
///
/// ```rust
/// use rackmix_core::fade_shape;
///
/// assert_eq!(fade_shape(0.5, 0.0), 0.5);
/// assert_eq!(fade_shape(0.5, 1.0), 0.125);
/// assert_eq!(fade_shape(1.0, -1.0), 1.0);
/// ```
#[inline]
pub fn fade_shape(x: f32, profile: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    let p = if profile.is_nan() { 0.0 } else { profile.clamp(-1.0, 1.0) };
    if p >= 0.0 {
        lerp(x, x * x * x, p)
    } else {
        let inv = 1.0 - x;
        lerp(x, 1.0 - inv * inv * inv, -p)
    }
}

/// Position `x` at which [`fade_shape`] reaches `gain`.
///
/// Used to restart a fade from the current gain without a jump.
pub fn fade_shape_inverse(gain: f32, profile: f32) -> f32 {
    let gain = gain.clamp(0.0, 1.0);
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..INVERSE_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if fade_shape(mid, profile) < gain {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_fixed_for_all_profiles() {
        for p in [-1.0, -0.5, 0.0, 0.3, 1.0] {
            assert_eq!(fade_shape(0.0, p), 0.0);
            assert_eq!(fade_shape(1.0, p), 1.0);
        }
    }

    #[test]
    fn exponential_below_linear_below_log() {
        let x = 0.4;
        assert!(fade_shape(x, 1.0) < fade_shape(x, 0.0));
        assert!(fade_shape(x, 0.0) < fade_shape(x, -1.0));
    }

    #[test]
    fn inverse_recovers_position() {
        for p in [-1.0, -0.25, 0.0, 0.6, 1.0] {
            for x in [0.1, 0.37, 0.5, 0.9] {
                let g = fade_shape(x, p);
                let back = fade_shape(fade_shape_inverse(g, p), p);
                assert!((back - g).abs() < 1e-5, "p={p} x={x}: {back} vs {g}");
            }
        }
    }

    #[test]
    fn nan_profile_is_linear() {
        assert_eq!(fade_shape(0.25, f32::NAN), 0.25);
    }
}
