//! AFSK text modem library for half-duplex acoustic messaging
//!
//! Binary FSK at 300 baud with Goertzel tone detection, a preamble + sync
//! word framing layer, and CRC-16-CCITT payload integrity.

use std::time::Duration;

pub mod controller;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod fsk;
pub mod goertzel;
pub mod receiver;
pub mod sync;

pub use controller::{AudioSink, Command, HalfDuplexController, ModemState, SessionReport};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ModemError, Result};
pub use framing::{DecodeStatus, DecodedPacket};
pub use fsk::BitOutcome;
pub use receiver::{AudioSource, StreamingReceiver};

// Channel configuration constants
pub const SAMPLE_RATE: usize = 8000;
pub const BAUD_RATE: usize = 300;

/// Samples per bit window. The 8000/300 ratio is not exact; the window
/// length is the truncated quotient, fixed for the life of the session.
pub const SAMPLES_PER_BIT: usize = SAMPLE_RATE / BAUD_RATE; // 26

/// Space frequency in Hz. 2200 Hz carries bit 0.
pub const FREQ_ZERO: f32 = 2200.0;

/// Mark frequency in Hz. 1200 Hz carries bit 1.
pub const FREQ_ONE: f32 = 1200.0;

/// Peak tone amplitude, -3 dBFS relative to full scale.
pub const TONE_AMPLITUDE: f32 = 0.707;

// Framing constants
pub const PREAMBLE_BYTE: u8 = 0xAA;
pub const PREAMBLE_LEN: usize = 4;
pub const SYNC_WORD: u16 = 0x2DD4;

/// Maximum payload length in bytes (the length field is a single byte).
pub const MAX_PAYLOAD_SIZE: usize = 255;

// Receive loop configuration
pub const RX_CHUNK_SAMPLES: usize = SAMPLES_PER_BIT * 4;
pub const RX_TIMEOUT: Duration = Duration::from_secs(10);
