use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{ModemError, Result};
use crate::framing::{bits_to_byte, decode_packet, DecodedPacket, CRC_BYTES, HEADER_BYTES};
use crate::fsk::FskDemodulator;
use crate::sync::trailing_match;
use crate::{RX_CHUNK_SAMPLES, RX_TIMEOUT, SAMPLES_PER_BIT};

/// Blocking live-audio input collaborator.
///
/// `read` blocks until `n` captured samples are available and returns them
/// together with an overflow flag. Overflow means the capture path lost
/// samples; bit alignment is gone and the session must abort. A source may
/// also fail the read outright (device error, stream closed, operator
/// cancellation), which aborts the session the same way.
pub trait AudioSource {
    fn read(&mut self, n: usize) -> Result<(Vec<f32>, bool)>;
}

/// Milestones surfaced by the streaming receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveProgress {
    /// Preamble + sync pattern landed at the tail of the bit accumulator.
    SyncDetected,
    /// Header parsed; the total packet bit count is now known.
    HeaderParsed { payload_len: usize },
}

/// Incremental receive loop over live audio chunks.
///
/// Pulls fixed-size chunks from the source, keeps a rolling sample buffer,
/// demodulates one bit window at a time, and checks for the frame-start
/// pattern after every appended bit. Once synchronized it keeps
/// accumulating (the accumulator is never reset) until the header is
/// parseable and the packet's full bit count has arrived, or the timeout
/// elapses.
pub struct StreamingReceiver {
    demodulator: FskDemodulator,
    timeout: Duration,
}

impl StreamingReceiver {
    pub fn new() -> Self {
        Self::with_timeout(RX_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            demodulator: FskDemodulator::new(),
            timeout,
        }
    }

    /// Listen until one packet is fully received or the session aborts.
    pub fn receive(&self, source: &mut dyn AudioSource, local_id: u8) -> Result<DecodedPacket> {
        self.receive_with(source, local_id, |_| {})
    }

    /// Like [`receive`](Self::receive), reporting progress milestones to
    /// the caller as they happen.
    pub fn receive_with(
        &self,
        source: &mut dyn AudioSource,
        local_id: u8,
        mut progress: impl FnMut(ReceiveProgress),
    ) -> Result<DecodedPacket> {
        let deadline = Instant::now() + self.timeout;

        let mut sample_buffer: Vec<f32> = Vec::with_capacity(RX_CHUNK_SAMPLES * 2);
        let mut bits: Vec<u8> = Vec::new();
        let mut synced = false;
        let mut header_start = 0usize;
        let mut expected_bits: Option<usize> = None;

        loop {
            if Instant::now() >= deadline {
                warn!("receive timed out after {:?}", self.timeout);
                return Err(ModemError::Timeout);
            }

            let (chunk, overflowed) = source.read(RX_CHUNK_SAMPLES)?;
            if overflowed {
                warn!("input overflow, aborting receive");
                return Err(ModemError::AudioSource("input overflow, samples lost".into()));
            }
            sample_buffer.extend_from_slice(&chunk);

            while sample_buffer.len() >= SAMPLES_PER_BIT {
                let window: Vec<f32> = sample_buffer.drain(..SAMPLES_PER_BIT).collect();
                let outcome = self.demodulator.demodulate_bit(&window);
                let bit = match outcome.bit() {
                    Some(bit) => bit,
                    // Ambiguous/Invalid windows are dropped, not buffered
                    None => continue,
                };
                bits.push(bit);

                if !synced {
                    if trailing_match(&bits) {
                        debug!("preamble + sync detected after {} bits", bits.len());
                        synced = true;
                        header_start = bits.len();
                        progress(ReceiveProgress::SyncDetected);
                    }
                    continue;
                }

                let packet_bits = bits.len() - header_start;
                if expected_bits.is_none() && packet_bits >= HEADER_BYTES * 8 {
                    let len_field = &bits[header_start + 16..header_start + 24];
                    let payload_len = bits_to_byte(len_field) as usize;
                    let total = (HEADER_BYTES + payload_len + CRC_BYTES) * 8;
                    debug!("header complete, expecting {total} packet bits");
                    expected_bits = Some(total);
                    progress(ReceiveProgress::HeaderParsed { payload_len });
                }

                if let Some(total) = expected_bits {
                    if packet_bits >= total {
                        info!("packet complete after {total} bits");
                        let packet = &bits[header_start..header_start + total];
                        return Ok(decode_packet(packet, local_id));
                    }
                }
            }
        }
    }
}

impl Default for StreamingReceiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::framing::DecodeStatus;

    /// Feeds a prerecorded sample sequence in source-sized reads, then
    /// fails like a closed capture stream.
    struct PlaybackSource {
        samples: Vec<f32>,
        pos: usize,
        overflow_at_read: Option<usize>,
        reads: usize,
    }

    impl PlaybackSource {
        fn new(samples: Vec<f32>) -> Self {
            Self {
                samples,
                pos: 0,
                overflow_at_read: None,
                reads: 0,
            }
        }
    }

    impl AudioSource for PlaybackSource {
        fn read(&mut self, n: usize) -> Result<(Vec<f32>, bool)> {
            self.reads += 1;
            if let Some(at) = self.overflow_at_read {
                if self.reads >= at {
                    return Ok((vec![0.0; n], true));
                }
            }
            if self.pos >= self.samples.len() {
                return Err(ModemError::AudioSource("capture stream closed".into()));
            }
            let end = (self.pos + n).min(self.samples.len());
            let mut chunk = self.samples[self.pos..end].to_vec();
            self.pos = end;
            // A real device always delivers the full request
            chunk.resize(n, 0.0);
            Ok((chunk, false))
        }
    }

    fn signal_for(message: &str, id_tx: u8, id_rx: u8) -> Vec<f32> {
        let mut samples = Encoder::new().encode(message, id_tx, id_rx).unwrap();
        // Tail padding keeps the source alive while the last windows drain
        samples.extend(std::iter::repeat(0.0).take(RX_CHUNK_SAMPLES * 4));
        samples
    }

    #[test]
    fn receives_a_packet_from_chunked_live_audio() {
        let mut source = PlaybackSource::new(signal_for("LIVE TEST", 5, 9));
        let receiver = StreamingReceiver::new();

        let packet = receiver.receive(&mut source, 9).unwrap();
        assert_eq!(packet.text, "LIVE TEST");
        assert!(packet.crc_ok);
        assert_eq!(packet.status, DecodeStatus::Ok);
    }

    #[test]
    fn reports_progress_milestones_in_order() {
        let mut source = PlaybackSource::new(signal_for("HI", 1, 2));
        let receiver = StreamingReceiver::new();

        let mut milestones = Vec::new();
        receiver
            .receive_with(&mut source, 2, |p| milestones.push(p))
            .unwrap();

        assert_eq!(
            milestones,
            vec![
                ReceiveProgress::SyncDetected,
                ReceiveProgress::HeaderParsed { payload_len: 2 },
            ]
        );
    }

    #[test]
    fn receives_despite_leading_bit_aligned_silence() {
        let mut samples = vec![0.0f32; SAMPLES_PER_BIT * 10];
        samples.extend(signal_for("PAD", 3, 4));
        let mut source = PlaybackSource::new(samples);

        let packet = StreamingReceiver::new().receive(&mut source, 4).unwrap();
        assert_eq!(packet.text, "PAD");
        assert!(packet.crc_ok);
    }

    #[test]
    fn overflow_aborts_the_session() {
        let mut source = PlaybackSource::new(signal_for("X", 1, 2));
        source.overflow_at_read = Some(2);

        match StreamingReceiver::new().receive(&mut source, 2) {
            Err(ModemError::AudioSource(_)) => {}
            other => panic!("expected AudioSource error, got {other:?}"),
        }
    }

    #[test]
    fn source_failure_aborts_without_partial_decode() {
        // Signal ends mid-packet; the source then reports a closed stream
        let full = Encoder::new().encode("TRUNCATED", 1, 2).unwrap();
        let cut = full.len() / 2;
        let mut source = PlaybackSource::new(full[..cut].to_vec());

        match StreamingReceiver::new().receive(&mut source, 2) {
            Err(ModemError::AudioSource(_)) => {}
            other => panic!("expected AudioSource error, got {other:?}"),
        }
    }

    #[test]
    fn times_out_while_waiting_for_sync() {
        let mut source = PlaybackSource::new(vec![0.0; RX_CHUNK_SAMPLES * 8]);
        let receiver = StreamingReceiver::with_timeout(Duration::ZERO);

        match receiver.receive(&mut source, 2) {
            Err(ModemError::Timeout) => {}
            other => panic!("expected Timeout, got {other:?}"),
        }
    }
}
