//! Adler-32 block checksums
//!
//! Both the compressed and the decompressed payload of a block carry an
//! Adler-32 (modulus 65521). The accumulator form lets a caller seed with 0
//! and resume across several segments.

use adler::Adler32;

use crate::{ChecksumStage, Error, Result};

/// Adler-32 modulus
pub const MODULUS: u32 = 65521;

/// Fold `bytes` into a running Adler-32 state.
///
/// A state of 0 is read as the identity seed (low word 1, high word 0), so
/// `adler_update(0, data)` equals the plain Adler-32 of `data`.
pub fn adler_update(state: u32, bytes: &[u8]) -> u32 {
    let seed = if state == 0 { 1 } else { state };
    let mut hasher = Adler32::from_checksum(seed);
    hasher.write_slice(bytes);
    hasher.checksum()
}

/// Adler-32 of a single contiguous buffer
#[inline]
pub fn adler32(bytes: &[u8]) -> u32 {
    adler_update(0, bytes)
}

/// Compare a declared checksum against the one computed over `bytes`
pub fn verify(stage: ChecksumStage, expected: u32, bytes: &[u8]) -> Result<()> {
    let actual = adler32(bytes);
    if actual != expected {
        return Err(Error::ChecksumMismatch {
            stage,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(adler32(&[]), 1);
        assert_eq!(adler_update(0, &[]), 1);
    }

    #[test]
    fn test_known_vector() {
        // Reference value from RFC 1950 implementations
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn test_resume_across_segments() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let (head, tail) = data.split_at(17);
        let resumed = adler_update(adler_update(0, head), tail);
        assert_eq!(resumed, adler32(data));
    }

    #[test]
    fn test_verify_reports_stage() {
        let err = verify(ChecksumStage::Compressed, 0xDEAD_BEEF, b"abc").unwrap_err();
        match err {
            Error::ChecksumMismatch { stage, expected, .. } => {
                assert_eq!(stage, ChecksumStage::Compressed);
                assert_eq!(expected, 0xDEAD_BEEF);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(verify(ChecksumStage::Decompressed, adler32(b"abc"), b"abc").is_ok());
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_is_detected(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let original = adler32(&data);
            let mut flipped = data.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(adler32(&flipped), original);
        }
    }
}
