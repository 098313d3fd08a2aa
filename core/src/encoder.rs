use crate::error::Result;
use crate::framing::{build_packet, packet_to_bits};
use crate::fsk::FskModulator;

/// Encodes a text message into an AFSK sample sequence ready for playback.
pub struct Encoder {
    modulator: FskModulator,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            modulator: FskModulator::new(),
        }
    }

    /// Build the wire packet and modulate every bit in order.
    ///
    /// Returns the full signal: preamble, sync word, header, payload, and
    /// CRC, one tone burst per bit.
    pub fn encode(&self, message: &str, id_tx: u8, id_rx: u8) -> Result<Vec<f32>> {
        let packet = build_packet(message, id_tx, id_rx)?;
        let bits = packet_to_bits(&packet);
        self.modulator.modulate_bits(&bits)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
