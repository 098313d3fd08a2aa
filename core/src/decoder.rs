use log::debug;

use crate::error::{ModemError, Result};
use crate::framing::{decode_packet, DecodedPacket};
use crate::fsk::FskDemodulator;
use crate::sync::find_sync;
use crate::SAMPLES_PER_BIT;

/// Offline decoder for a fully captured sample sequence (e.g. a WAV file).
pub struct Decoder {
    demodulator: FskDemodulator,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            demodulator: FskDemodulator::new(),
        }
    }

    /// Demodulate every whole bit window, locate the frame-start pattern,
    /// and decode the packet that follows it.
    ///
    /// Ambiguous and Invalid windows are dropped from the bit sequence, so
    /// a corrupted preamble shifts alignment until the next cleanly
    /// received preamble + sync occurrence. There is no finer-grained
    /// resynchronization.
    pub fn decode(&self, samples: &[f32], local_id: u8) -> Result<DecodedPacket> {
        let bits = self.demodulate_all(samples);
        debug!("demodulated {} bits from {} samples", bits.len(), samples.len());

        let header_start = find_sync(&bits).ok_or(ModemError::SyncNotFound)?;
        debug!("sync pattern found, header starts at bit {header_start}");

        Ok(decode_packet(&bits[header_start..], local_id))
    }

    fn demodulate_all(&self, samples: &[f32]) -> Vec<u8> {
        let mut bits = Vec::with_capacity(samples.len() / SAMPLES_PER_BIT);
        // A trailing partial window is skipped, same as any undersized read
        for window in samples.chunks_exact(SAMPLES_PER_BIT) {
            if let Some(bit) = self.demodulator.demodulate_bit(window).bit() {
                bits.push(bit);
            }
        }
        bits
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
