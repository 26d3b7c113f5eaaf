//! Four-lane gain vector for stereo pan matrices.
//!
//! A stereo channel strip multiplies the signal vector `[L, R, R, L]` by a
//! gain matrix laid out as
//!
//! ```text
//! lane 0: L <- L      lane 1: R <- R
//! lane 2: L <- R      lane 3: R <- L
//! ```
//!
//! and folds lanes 0+2 into the left output and 1+3 into the right output.
//! The two cross lanes carry true-pan redistribution; for plain balance they
//! stay at zero.
//!
//! [`Gain4`] is a plain `[f32; 4]` wrapper with elementwise operations. The
//! compiler auto-vectorises these loops on targets with 128-bit SIMD.

use core::ops::{Add, Mul, Sub};

/// Four `f32` lanes operated on elementwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gain4(pub [f32; 4]);

impl Gain4 {
    /// All lanes zero.
    pub const ZERO: Self = Self([0.0; 4]);

    /// Unity stereo passthrough: `[1, 1, 0, 0]`.
    pub const IDENTITY: Self = Self([1.0, 1.0, 0.0, 0.0]);

    /// Broadcast one value to every lane.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self([v; 4])
    }

    /// Build from individual lanes.
    #[inline]
    pub const fn new(ll: f32, rr: f32, lr: f32, rl: f32) -> Self {
        Self([ll, rr, lr, rl])
    }

    /// Signal vector `[L, R, R, L]` for a stereo frame.
    #[inline]
    pub const fn from_stereo(left: f32, right: f32) -> Self {
        Self([left, right, right, left])
    }

    /// Lane-by-lane equality mask, one bit per lane (bit 0 = lane 0).
    ///
    /// `0xF` means all four lanes match.
    #[inline]
    pub fn eq_mask(&self, other: &Self) -> u8 {
        let mut mask = 0u8;
        for (i, (a, b)) in self.0.iter().zip(other.0.iter()).enumerate() {
            if a == b {
                mask |= 1 << i;
            }
        }
        mask
    }

    /// Fold a product vector back into a stereo pair: `(l0 + l2, l1 + l3)`.
    #[inline]
    pub fn fold(&self) -> (f32, f32) {
        (self.0[0] + self.0[2], self.0[1] + self.0[3])
    }

    /// Multiply every lane by a scalar.
    #[inline]
    pub fn scale(&self, k: f32) -> Self {
        Self(self.0.map(|v| v * k))
    }

    /// Elementwise clamp of each lane to `[-limit, limit]`.
    #[inline]
    pub fn clamp_delta(&self, limit: f32) -> Self {
        Self(self.0.map(|v| v.clamp(-limit, limit)))
    }
}

impl Add for Gain4 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o += r;
        }
        Self(out)
    }
}

impl Sub for Gain4 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o -= r;
        }
        Self(out)
    }
}

impl Mul for Gain4 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o *= r;
        }
        Self(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_stereo() {
        let sig = Gain4::from_stereo(0.3, -0.7);
        let (l, r) = (sig * Gain4::IDENTITY).fold();
        assert_eq!(l, 0.3);
        assert_eq!(r, -0.7);
    }

    #[test]
    fn cross_lanes_route_opposite_side() {
        // Right input fully into left output
        let m = Gain4::new(1.0, 0.0, 1.0, 0.0);
        let (l, r) = (Gain4::from_stereo(0.25, 0.5) * m).fold();
        assert_eq!(l, 0.75);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn eq_mask_bits() {
        let a = Gain4::new(1.0, 2.0, 3.0, 4.0);
        let b = Gain4::new(1.0, 0.0, 3.0, 0.0);
        assert_eq!(a.eq_mask(&a), 0xF);
        assert_eq!(a.eq_mask(&b), 0b0101);
    }

    #[test]
    fn arithmetic() {
        let a = Gain4::splat(2.0);
        let b = Gain4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a + b, Gain4::new(3.0, 4.0, 5.0, 6.0));
        assert_eq!(b - a, Gain4::new(-1.0, 0.0, 1.0, 2.0));
        assert_eq!(b.scale(0.5), Gain4::new(0.5, 1.0, 1.5, 2.0));
        assert_eq!(
            Gain4::new(-3.0, 0.1, 3.0, -0.1).clamp_delta(0.5),
            Gain4::new(-0.5, 0.1, 0.5, -0.1)
        );
    }
}
