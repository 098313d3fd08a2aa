use crate::{PREAMBLE_BYTE, PREAMBLE_LEN, SYNC_WORD};

/// Length in bits of the preamble + sync word pattern.
pub const SYNC_PATTERN_BITS: usize = (PREAMBLE_LEN + 2) * 8; // 48

/// The full frame-start pattern, MSB-first: four preamble bytes (0xAA)
/// followed by the 16-bit sync word (0x2DD4).
pub const SYNC_PATTERN: [u8; SYNC_PATTERN_BITS] = build_sync_pattern();

const fn build_sync_pattern() -> [u8; SYNC_PATTERN_BITS] {
    let mut pattern = [0u8; SYNC_PATTERN_BITS];
    let preamble_bits = PREAMBLE_LEN * 8;

    let mut i = 0;
    while i < preamble_bits {
        pattern[i] = (PREAMBLE_BYTE >> (7 - (i % 8))) & 1;
        i += 1;
    }

    let mut j = 0;
    while j < 16 {
        pattern[preamble_bits + j] = ((SYNC_WORD >> (15 - j)) & 1) as u8;
        j += 1;
    }

    pattern
}

/// Scan a bit sequence for the first occurrence of the frame-start pattern.
///
/// Returns the index of the bit immediately after the pattern (the first
/// header bit), or None when no exact match exists anywhere in the
/// sequence. First match wins; there is no fuzzy or partial matching.
pub fn find_sync(bits: &[u8]) -> Option<usize> {
    bits.windows(SYNC_PATTERN_BITS)
        .position(|window| window == SYNC_PATTERN)
        .map(|start| start + SYNC_PATTERN_BITS)
}

/// True when the last 48 accumulated bits equal the frame-start pattern.
///
/// Streaming receivers call this after every appended bit, so sync
/// detection never re-scans history.
pub fn trailing_match(bits: &[u8]) -> bool {
    bits.len() >= SYNC_PATTERN_BITS && bits[bits.len() - SYNC_PATTERN_BITS..] == SYNC_PATTERN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_encodes_preamble_then_sync_word() {
        // 0xAA is 10101010 MSB-first
        assert_eq!(&SYNC_PATTERN[..8], &[1, 0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(&SYNC_PATTERN[24..32], &[1, 0, 1, 0, 1, 0, 1, 0]);
        // 0x2DD4 is 0010110111010100 MSB-first
        assert_eq!(
            &SYNC_PATTERN[32..],
            &[0, 0, 1, 0, 1, 1, 0, 1, 1, 1, 0, 1, 0, 1, 0, 0]
        );
    }

    #[test]
    fn find_sync_returns_index_after_pattern() {
        let mut bits = vec![0u8, 1, 1, 0, 0];
        bits.extend_from_slice(&SYNC_PATTERN);
        bits.extend_from_slice(&[1, 0, 1]);

        assert_eq!(find_sync(&bits), Some(5 + SYNC_PATTERN_BITS));
    }

    #[test]
    fn find_sync_locates_pattern_at_the_very_end() {
        let mut bits = vec![0u8; 7];
        bits.extend_from_slice(&SYNC_PATTERN);

        assert_eq!(find_sync(&bits), Some(bits.len()));
    }

    #[test]
    fn find_sync_reports_absence() {
        assert_eq!(find_sync(&[]), None);
        assert_eq!(find_sync(&[1, 0, 1, 0]), None);
        // 47 bits of the pattern are not a match
        assert_eq!(find_sync(&SYNC_PATTERN[..47]), None);
    }

    #[test]
    fn find_sync_first_match_wins() {
        let mut bits = Vec::new();
        bits.extend_from_slice(&SYNC_PATTERN);
        bits.push(1);
        bits.extend_from_slice(&SYNC_PATTERN);

        assert_eq!(find_sync(&bits), Some(SYNC_PATTERN_BITS));
    }

    #[test]
    fn trailing_match_checks_the_accumulator_tail() {
        let mut bits = vec![1u8, 1, 0];
        assert!(!trailing_match(&bits));

        bits.extend_from_slice(&SYNC_PATTERN);
        assert!(trailing_match(&bits));

        bits.push(0);
        assert!(!trailing_match(&bits));
    }

    #[test]
    fn trailing_match_requires_full_pattern_length() {
        assert!(!trailing_match(&SYNC_PATTERN[..47]));
        assert!(trailing_match(&SYNC_PATTERN));
    }
}
