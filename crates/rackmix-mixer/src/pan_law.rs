//! Pan laws and the cached pan matrix.
//!
//! A pan law maps a pan position `p` in `[0, 1]` (0.5 = centre) to a
//! [`Gain4`] matrix applied to the signal vector `[L, R, R, L]`. Every law
//! is unity at the centre.
//!
//! Mono sources (a track with only its left input connected) use a
//! [`MonoPanLaw`]; the right input is a copy of the left, so only the two
//! direct lanes are ever non-zero:
//!
//! | law | centre boost at the side | left gain |
//! |-----|--------------------------|-----------|
//! | [`Flat`](MonoPanLaw::Flat) | +0 dB | `min(1, 2 - 2p)` |
//! | [`EqualPower`](MonoPanLaw::EqualPower) | +3 dB | `√2·cos(pπ/2)` |
//! | [`Compromise`](MonoPanLaw::Compromise) | +4.5 dB | geometric mean of the two neighbours |
//! | [`Linear`](MonoPanLaw::Linear) | +6 dB | `2 - 2p` |
//!
//! Stereo sources, groups and aux returns use a [`StereoPanLaw`]. The two
//! balance laws only attenuate (or, for the +3 dB variant, boost) each side;
//! true pan folds the far side into the near one through the cross lanes.

use core::f32::consts::{FRAC_PI_2, SQRT_2};

use libm::{cosf, sinf, sqrtf};
use rackmix_core::Gain4;

/// Pan law for mono sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MonoPanLaw {
    /// No side boost, linear taper clipped at unity
    Flat = 0,
    /// +3 dB side boost, sine/cosine taper
    #[default]
    EqualPower = 1,
    /// +4.5 dB side boost
    Compromise = 2,
    /// +6 dB side boost, straight ramp
    Linear = 3,
}

/// Pan law for stereo sources and buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum StereoPanLaw {
    /// Balance without compensation
    BalanceLinear = 0,
    /// Balance with +3 dB on the near side
    #[default]
    BalanceEqualPower = 1,
    /// Equal-power redistribution of the far channel into the near one
    TruePan = 2,
}

impl MonoPanLaw {
    /// Every law in selector order.
    pub const ALL: [Self; 4] = [Self::Flat, Self::EqualPower, Self::Compromise, Self::Linear];

    /// Law for a persisted selector value.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Persisted selector value.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Flat => "+0 dB (no compensation)",
            Self::EqualPower => "+3 dB boost (equal power)",
            Self::Compromise => "+4.5 dB boost (compromise)",
            Self::Linear => "+6 dB boost (linear)",
        }
    }
}

impl StereoPanLaw {
    /// Every law in selector order.
    pub const ALL: [Self; 3] = [Self::BalanceLinear, Self::BalanceEqualPower, Self::TruePan];

    /// Law for a persisted selector value.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Persisted selector value.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::BalanceLinear => "Stereo balance linear",
            Self::BalanceEqualPower => "Stereo balance +3 dB",
            Self::TruePan => "True panning",
        }
    }
}

/// Sanitise a pan value: NaN reads as centre, everything else is clamped.
#[inline]
pub fn clamp_pan(pan: f32) -> f32 {
    if pan.is_nan() { 0.5 } else { pan.clamp(0.0, 1.0) }
}

#[inline]
fn quarter_cos(q: f32) -> f32 {
    cosf(q * FRAC_PI_2).max(0.0)
}

#[inline]
fn quarter_sin(q: f32) -> f32 {
    sinf(q * FRAC_PI_2).max(0.0)
}

/// `(left, right)` side gains of the equal-power taper, unity at centre.
#[inline]
fn equal_power_sides(pan: f32) -> (f32, f32) {
    if pan == 0.5 {
        return (1.0, 1.0);
    }
    (SQRT_2 * quarter_cos(pan), SQRT_2 * quarter_sin(pan))
}

/// Pan matrix of a mono source.
pub fn mono_pan_matrix(pan: f32, law: MonoPanLaw) -> Gain4 {
    let p = clamp_pan(pan);
    let linear = (2.0 - 2.0 * p, 2.0 * p);
    let (l, r) = match law {
        MonoPanLaw::Flat => (linear.0.min(1.0), linear.1.min(1.0)),
        MonoPanLaw::EqualPower => equal_power_sides(p),
        MonoPanLaw::Compromise => {
            let eq = equal_power_sides(p);
            (sqrtf(eq.0 * linear.0), sqrtf(eq.1 * linear.1))
        }
        MonoPanLaw::Linear => linear,
    };
    Gain4::new(l, r, 0.0, 0.0)
}

/// Pan matrix of a stereo source or bus.
pub fn stereo_pan_matrix(pan: f32, law: StereoPanLaw) -> Gain4 {
    let p = clamp_pan(pan);
    match law {
        StereoPanLaw::BalanceLinear => {
            Gain4::new((2.0 - 2.0 * p).min(1.0), (2.0 * p).min(1.0), 0.0, 0.0)
        }
        StereoPanLaw::BalanceEqualPower => {
            let (l, r) = equal_power_sides(p);
            Gain4::new(l, r, 0.0, 0.0)
        }
        StereoPanLaw::TruePan => {
            if p <= 0.5 {
                // Right input splits between the right and left outputs
                let q = 2.0 * p;
                Gain4::new(1.0, quarter_sin(q), quarter_cos(q), 0.0)
            } else {
                let q = 2.0 * (p - 0.5);
                Gain4::new(quarter_cos(q), 1.0, 0.0, quarter_sin(q))
            }
        }
    }
}

/// Everything besides the pan position that selects a channel's pan law.
///
/// Two signatures compare equal exactly when the resulting law is the same
/// function of pan, so the cache only recomputes when something relevant
/// changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanLawSignature {
    /// Per-channel stereo override (`None` = follow global)
    pub local: Option<StereoPanLaw>,
    /// Global stereo law
    pub global_stereo: StereoPanLaw,
    /// Global mono law
    pub global_mono: MonoPanLaw,
    /// Whether the source is stereo
    pub stereo: bool,
}

impl PanLawSignature {
    /// Compute the matrix this signature selects for `pan`.
    pub fn matrix(&self, pan: f32) -> Gain4 {
        if self.stereo {
            stereo_pan_matrix(pan, self.local.unwrap_or(self.global_stereo))
        } else {
            mono_pan_matrix(pan, self.global_mono)
        }
    }
}

/// Pan matrix cache keyed by pan position and law signature.
///
/// Trigonometry runs only when either input moved since the last call.
#[derive(Debug, Clone)]
pub struct PanCache {
    old_pan: f32,
    old_signature: Option<PanLawSignature>,
    matrix: Gain4,
}

impl PanCache {
    /// An empty cache; the first [`update`](Self::update) always computes.
    pub fn new() -> Self {
        Self {
            old_pan: -1.0,
            old_signature: None,
            matrix: Gain4::IDENTITY,
        }
    }

    /// Matrix for `pan` under `signature`, recomputed only on change.
    #[inline]
    pub fn update(&mut self, pan: f32, signature: PanLawSignature) -> Gain4 {
        if pan != self.old_pan || self.old_signature != Some(signature) {
            self.old_pan = pan;
            self.old_signature = Some(signature);
            self.matrix = signature.matrix(pan);
        }
        self.matrix
    }

    /// Current cached matrix.
    pub fn matrix(&self) -> Gain4 {
        self.matrix
    }

    /// Forget the cached inputs so the next update recomputes.
    pub fn invalidate(&mut self) {
        self.old_pan = -1.0;
        self.old_signature = None;
    }
}

impl Default for PanCache {
    fn default() -> Self {
        Self::new()
    }
}
