//! Host audio-port contract.
//!
//! The host owns the jacks; the mixer only asks whether a cable is plugged
//! in, how many polyphonic channels it carries and what voltage each one
//! holds. All reads through [`AudioPort::read`] and [`AudioPort::poly_sum`]
//! are clamped to ±20 V.

use crate::math::clamp_voltage;

/// Maximum polyphony of a single cable.
pub const MAX_POLY_CHANNELS: usize = 16;

/// A jack as seen from the mixer.
pub trait AudioPort {
    /// True when a cable is connected.
    fn is_connected(&self) -> bool;

    /// Number of polyphonic channels carried (0 when disconnected).
    fn channels(&self) -> usize;

    /// Raw voltage of one channel. May be anything, including NaN.
    fn voltage(&self, channel: usize) -> f32;

    /// Clamped voltage of one channel.
    #[inline]
    fn read(&self, channel: usize) -> f32 {
        clamp_voltage(self.voltage(channel))
    }

    /// Clamped sum of all polyphonic channels. 0 V when disconnected.
    #[inline]
    fn poly_sum(&self) -> f32 {
        let mut sum = 0.0;
        for ch in 0..self.channels() {
            sum += self.voltage(ch);
        }
        clamp_voltage(sum)
    }
}

/// Plain in-memory jack for hosts, tests and offline rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jack {
    voltages: [f32; MAX_POLY_CHANNELS],
    channels: u8,
}

impl Jack {
    /// An unplugged jack.
    pub const fn disconnected() -> Self {
        Self {
            voltages: [0.0; MAX_POLY_CHANNELS],
            channels: 0,
        }
    }

    /// A connected monophonic jack at `v` volts.
    pub const fn mono(v: f32) -> Self {
        let mut voltages = [0.0; MAX_POLY_CHANNELS];
        voltages[0] = v;
        Self {
            voltages,
            channels: 1,
        }
    }

    /// Set the voltage of a connected mono jack, plugging it in if needed.
    #[inline]
    pub fn set(&mut self, v: f32) {
        self.voltages[0] = v;
        if self.channels == 0 {
            self.channels = 1;
        }
    }

    /// Set one polyphonic channel, widening the cable as needed.
    /// Channels beyond [`MAX_POLY_CHANNELS`] are ignored.
    pub fn set_poly(&mut self, channel: usize, v: f32) {
        if let Some(slot) = self.voltages.get_mut(channel) {
            *slot = v;
            self.channels = self.channels.max(channel as u8 + 1);
        }
    }

    /// Unplug the cable.
    pub fn disconnect(&mut self) {
        *self = Self::disconnected();
    }
}

impl Default for Jack {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl AudioPort for Jack {
    #[inline]
    fn is_connected(&self) -> bool {
        self.channels > 0
    }

    #[inline]
    fn channels(&self) -> usize {
        self.channels as usize
    }

    #[inline]
    fn voltage(&self, channel: usize) -> f32 {
        if channel < self.channels as usize {
            self.voltages[channel]
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_reads_zero() {
        let jack = Jack::disconnected();
        assert!(!jack.is_connected());
        assert_eq!(jack.poly_sum(), 0.0);
    }

    #[test]
    fn poly_sum_is_clamped() {
        let mut jack = Jack::disconnected();
        for ch in 0..4 {
            jack.set_poly(ch, 8.0);
        }
        assert_eq!(jack.channels(), 4);
        assert_eq!(jack.poly_sum(), 20.0);
    }

    #[test]
    fn read_clamps_single_channel() {
        let jack = Jack::mono(-50.0);
        assert_eq!(jack.read(0), -20.0);
        assert_eq!(jack.read(3), 0.0);
    }

    #[test]
    fn out_of_range_poly_channel_ignored() {
        let mut jack = Jack::disconnected();
        jack.set_poly(MAX_POLY_CHANNELS, 1.0);
        assert!(!jack.is_connected());
    }
}
