use std::f32::consts::PI;

use crate::error::{ModemError, Result};
use crate::goertzel::tone_energy;
use crate::{FREQ_ONE, FREQ_ZERO, SAMPLES_PER_BIT, SAMPLE_RATE, TONE_AMPLITUDE};

/// Decision outcome for one demodulated bit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOutcome {
    Zero,
    One,
    /// Equal energy at both tones (silence, or neither tone present).
    Ambiguous,
    /// Window length does not match the bit period.
    Invalid,
}

impl BitOutcome {
    /// The decided bit value, or None for Ambiguous/Invalid outcomes.
    ///
    /// Callers accumulating a bit sequence drop the None outcomes rather
    /// than inserting placeholders, so a bad window shifts the alignment
    /// of everything after it. The protocol accepts that: the receiver
    /// simply waits for the next cleanly aligned preamble + sync word.
    pub fn bit(self) -> Option<u8> {
        match self {
            BitOutcome::Zero => Some(0),
            BitOutcome::One => Some(1),
            BitOutcome::Ambiguous | BitOutcome::Invalid => None,
        }
    }
}

/// Binary AFSK modulator: one fixed-frequency tone burst per bit.
pub struct FskModulator {
    sample_rate: usize,
    samples_per_bit: usize,
}

impl FskModulator {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            samples_per_bit: SAMPLES_PER_BIT,
        }
    }

    /// Generate the tone burst for a single bit.
    ///
    /// 2200 Hz carries bit 0 and 1200 Hz carries bit 1. Peak amplitude is
    /// held at -3 dBFS so the 16-bit PCM conversion never clips.
    pub fn modulate_bit(&self, bit: u8) -> Result<Vec<f32>> {
        let freq = match bit {
            0 => FREQ_ZERO,
            1 => FREQ_ONE,
            other => return Err(ModemError::InvalidBitValue(other)),
        };

        let angular = 2.0 * PI * freq / self.sample_rate as f32;
        Ok((0..self.samples_per_bit)
            .map(|i| TONE_AMPLITUDE * (angular * i as f32).sin())
            .collect())
    }

    /// Modulate a bit sequence into one contiguous sample run.
    pub fn modulate_bits(&self, bits: &[u8]) -> Result<Vec<f32>> {
        let mut samples = Vec::with_capacity(bits.len() * self.samples_per_bit);
        for &bit in bits {
            samples.extend_from_slice(&self.modulate_bit(bit)?);
        }
        Ok(samples)
    }
}

impl Default for FskModulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary AFSK demodulator: non-coherent energy comparison at the two tones.
pub struct FskDemodulator {
    sample_rate: usize,
    samples_per_bit: usize,
}

impl FskDemodulator {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            samples_per_bit: SAMPLES_PER_BIT,
        }
    }

    /// Decide one bit from a window of samples by comparing Goertzel
    /// energies at the two tone frequencies.
    pub fn demodulate_bit(&self, window: &[f32]) -> BitOutcome {
        if window.len() != self.samples_per_bit {
            return BitOutcome::Invalid;
        }

        let energy_zero = tone_energy(window, FREQ_ZERO, self.sample_rate);
        let energy_one = tone_energy(window, FREQ_ONE, self.sample_rate);

        if energy_zero > energy_one {
            BitOutcome::Zero
        } else if energy_one > energy_zero {
            BitOutcome::One
        } else {
            BitOutcome::Ambiguous
        }
    }
}

impl Default for FskDemodulator {
    fn default() -> Self {
        Self::new()
    }
}
