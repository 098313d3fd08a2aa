use crate::error::{ModemError, Result};
use crate::{MAX_PAYLOAD_SIZE, PREAMBLE_BYTE, PREAMBLE_LEN, SYNC_WORD};

/// Bytes of addressing header ahead of the payload: id_tx, id_rx, len.
pub const HEADER_BYTES: usize = 3;

/// Bytes of CRC trailing the payload.
pub const CRC_BYTES: usize = 2;

/// CRC-16-CCITT: polynomial 0x1021, init 0xFFFF, no reflection, no xor-out.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Build the complete wire packet for a text message.
///
/// Layout: `preamble(4) | sync(2) | id_tx(1) | id_rx(1) | len(1) | payload | crc16(2)`.
/// The CRC covers id_tx through the end of the payload; preamble and sync
/// word are synchronization fields only and stay outside the CRC input.
pub fn build_packet(message: &str, id_tx: u8, id_rx: u8) -> Result<Vec<u8>> {
    if !message.is_ascii() {
        return Err(ModemError::NonAsciiPayload);
    }
    let payload = message.as_bytes();
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ModemError::PayloadTooLong);
    }

    let mut packet =
        Vec::with_capacity(PREAMBLE_LEN + 2 + HEADER_BYTES + payload.len() + CRC_BYTES);
    packet.extend_from_slice(&[PREAMBLE_BYTE; PREAMBLE_LEN]);
    packet.extend_from_slice(&SYNC_WORD.to_be_bytes());
    packet.push(id_tx);
    packet.push(id_rx);
    packet.push(payload.len() as u8);
    packet.extend_from_slice(payload);

    let crc = crc16(&packet[PREAMBLE_LEN + 2..]);
    packet.extend_from_slice(&crc.to_be_bytes());

    Ok(packet)
}

/// Expand packet bytes into a bit sequence, MSB-first per byte.
pub fn packet_to_bits(packet: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(packet.len() * 8);
    for &byte in packet {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Reassemble one byte from exactly eight MSB-first bits.
pub(crate) fn bits_to_byte(bits: &[u8]) -> u8 {
    bits.iter().fold(0, |byte, &bit| (byte << 1) | bit)
}

fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8).map(bits_to_byte).collect()
}

/// Terminal classification of a decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Payload delivered and CRC verified.
    Ok,
    /// Fewer than 24 bits after sync; no header to parse.
    HeaderTooShort,
    /// Header id_rx does not match the local id; payload and CRC unread.
    NotAddressed,
    /// Header parsed but the bit sequence ends before payload + CRC.
    Truncated,
    /// Payload delivered but the received CRC does not match.
    CrcMismatch,
}

/// Structured result of decoding the bits that follow a sync match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub text: String,
    pub crc_ok: bool,
    pub addressed: bool,
    pub status: DecodeStatus,
}

impl DecodedPacket {
    fn empty(addressed: bool, status: DecodeStatus) -> Self {
        Self {
            text: String::new(),
            crc_ok: false,
            addressed,
            status,
        }
    }
}

/// Decode the packet bits that follow the sync word.
///
/// Every outcome is a structured result; nothing escapes as an error.
/// Packets addressed to another endpoint are dropped after the 24-bit
/// header without parsing the payload or checking the CRC.
pub fn decode_packet(bits: &[u8], local_id: u8) -> DecodedPacket {
    if bits.len() < HEADER_BYTES * 8 {
        return DecodedPacket::empty(false, DecodeStatus::HeaderTooShort);
    }

    let id_tx = bits_to_byte(&bits[0..8]);
    let id_rx = bits_to_byte(&bits[8..16]);
    let payload_len = bits_to_byte(&bits[16..24]) as usize;

    if id_rx != local_id {
        return DecodedPacket::empty(false, DecodeStatus::NotAddressed);
    }

    let total_bits = (HEADER_BYTES + payload_len + CRC_BYTES) * 8;
    if bits.len() < total_bits {
        return DecodedPacket::empty(true, DecodeStatus::Truncated);
    }

    let payload_start = HEADER_BYTES * 8;
    let payload_end = payload_start + payload_len * 8;
    let payload = bits_to_bytes(&bits[payload_start..payload_end]);
    let crc_received = bits_to_bytes(&bits[payload_end..total_bits]);

    let mut covered = vec![id_tx, id_rx, payload_len as u8];
    covered.extend_from_slice(&payload);
    let crc_ok =
        crc16(&covered) == u16::from_be_bytes([crc_received[0], crc_received[1]]);

    let text = payload.iter().map(|&byte| byte as char).collect();
    let status = if crc_ok {
        DecodeStatus::Ok
    } else {
        DecodeStatus::CrcMismatch
    };

    DecodedPacket {
        text,
        crc_ok,
        addressed: true,
        status,
    }
}
