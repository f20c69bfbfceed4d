//! Nucleotide codec
//!
//! Table-driven translation between ASCII nucleotides and packed bit-fields.
//!
//! Symbols are packed into bytes starting from the least-significant bits:
//! symbol `i` of a sequence lives in byte `i / per_byte` at bit offset
//! `(i % per_byte) * width`. Unused trailing bits of the final byte are zero.
//!
//! Two encoding modes are supported:
//!
//! | Mode      | Width | Per byte | Alphabet                          |
//! | --------- | ----- | -------- | --------------------------------- |
//! | `TwoBit`  | 2     | 4        | `A=0 C=1 G=2 T=3`                 |
//! | `FourBit` | 4     | 2        | IUPAC one-hot (`A=1 C=2 G=4 T=8`) |
//!
//! In four-bit mode the code `0` has no symbol and is rejected on unpacking.
//! Only uppercase symbols are part of either alphabet.

use crate::error::{EncodingError, FormatError, Result};

/// Marker for a byte without an assigned code
const INVALID: u8 = 0xFF;

/// Symbols by two-bit code
const TWO_BIT_SYMBOLS: [u8; 4] = *b"ACGT";

/// Symbols by four-bit code (code 0 is unassigned)
const FOUR_BIT_SYMBOLS: [u8; 16] = *b"\0ACMGRSVTWYHKDBN";

const TWO_BIT_ENCODING: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < TWO_BIT_SYMBOLS.len() {
        table[TWO_BIT_SYMBOLS[i] as usize] = i as u8;
        i += 1;
    }
    table
};

const FOUR_BIT_ENCODING: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 1;
    while i < FOUR_BIT_SYMBOLS.len() {
        table[FOUR_BIT_SYMBOLS[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Every packed two-bit byte expanded to its four symbols
const TWO_BIT_BYTE_DECODING: [[u8; 4]; 256] = {
    let mut table = [[0u8; 4]; 256];
    let mut byte = 0;
    while byte < 256 {
        let mut offset = 0;
        while offset < 4 {
            table[byte][offset] = TWO_BIT_SYMBOLS[(byte >> (offset * 2)) & 0b11];
            offset += 1;
        }
        byte += 1;
    }
    table
};

/// The number of bits used to pack each nucleotide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingMode {
    /// Canonical bases only (`ACGT`), four per byte
    #[default]
    TwoBit,
    /// IUPAC ambiguity codes including `N`, two per byte
    FourBit,
}
impl EncodingMode {
    /// Number of bits occupied by a single symbol
    #[must_use]
    pub fn bits_per_symbol(self) -> usize {
        match self {
            Self::TwoBit => 2,
            Self::FourBit => 4,
        }
    }

    /// Number of symbols sharing one byte
    #[must_use]
    pub fn symbols_per_byte(self) -> usize {
        8 / self.bits_per_symbol()
    }

    /// Number of bytes required to pack `num_symbols` symbols
    ///
    /// ```
    /// use binseq::EncodingMode;
    ///
    /// assert_eq!(EncodingMode::TwoBit.packed_len(5), 2);
    /// assert_eq!(EncodingMode::FourBit.packed_len(5), 3);
    /// ```
    #[must_use]
    pub fn packed_len(self, num_symbols: usize) -> usize {
        num_symbols.div_ceil(self.symbols_per_byte())
    }

    /// Checks whether a single symbol belongs to the alphabet
    #[inline]
    #[must_use]
    pub fn is_valid_symbol(self, symbol: u8) -> bool {
        self.encoding_table()[symbol as usize] != INVALID
    }

    /// Checks whether every symbol of the sequence belongs to the alphabet
    #[must_use]
    pub fn is_valid(self, sequence: &[u8]) -> bool {
        sequence.iter().all(|&n| self.is_valid_symbol(n))
    }

    fn mask(self) -> u8 {
        match self {
            Self::TwoBit => 0b11,
            Self::FourBit => 0b1111,
        }
    }

    fn encoding_table(self) -> &'static [u8; 256] {
        match self {
            Self::TwoBit => &TWO_BIT_ENCODING,
            Self::FourBit => &FOUR_BIT_ENCODING,
        }
    }

    fn decoding_table(self) -> &'static [u8] {
        match self {
            Self::TwoBit => &TWO_BIT_SYMBOLS,
            Self::FourBit => &FOUR_BIT_SYMBOLS,
        }
    }
}
impl From<EncodingMode> for u8 {
    fn from(mode: EncodingMode) -> Self {
        mode.bits_per_symbol() as u8
    }
}
impl TryFrom<u8> for EncodingMode {
    type Error = FormatError;
    fn try_from(tag: u8) -> std::result::Result<Self, Self::Error> {
        match tag {
            2 => Ok(Self::TwoBit),
            4 => Ok(Self::FourBit),
            x => Err(FormatError::InvalidEncodingMode(x)),
        }
    }
}

/// Packs an ASCII sequence into `out`
///
/// The buffer is cleared first and holds exactly `mode.packed_len(sequence.len())`
/// bytes on success. On failure the buffer is left empty.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidSymbol`] on the first symbol outside the alphabet.
///
/// ```
/// use binseq::{codec, EncodingMode};
///
/// let mut packed = Vec::new();
/// codec::pack(b"ACGT", EncodingMode::TwoBit, &mut packed).unwrap();
/// assert_eq!(packed, vec![0b1110_0100]);
/// ```
pub fn pack(sequence: &[u8], mode: EncodingMode, out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    out.resize(mode.packed_len(sequence.len()), 0);
    if let Err(e) = pack_into(sequence, mode, out) {
        out.clear();
        return Err(e);
    }
    Ok(())
}

/// Packs an ASCII sequence into a caller-provided slice
///
/// Returns the number of bytes written.
pub fn pack_into(sequence: &[u8], mode: EncodingMode, out: &mut [u8]) -> Result<usize> {
    let expected = mode.packed_len(sequence.len());
    if out.len() < expected {
        return Err(EncodingError::ShortBuffer {
            expected,
            got: out.len(),
        }
        .into());
    }

    let table = mode.encoding_table();
    let width = mode.bits_per_symbol();
    let per_byte = mode.symbols_per_byte();
    for (chunk_idx, (chunk, byte)) in sequence.chunks(per_byte).zip(out.iter_mut()).enumerate() {
        let mut packed = 0u8;
        for (offset, &symbol) in chunk.iter().enumerate() {
            let code = table[symbol as usize];
            if code == INVALID {
                return Err(EncodingError::InvalidSymbol {
                    symbol,
                    position: chunk_idx * per_byte + offset,
                }
                .into());
            }
            packed |= code << (offset * width);
        }
        *byte = packed;
    }
    Ok(expected)
}

/// Unpacks `num_symbols` symbols into `out`
///
/// The buffer is cleared and then resized to `num_symbols`, so a buffer reused
/// across calls only allocates while it is still growing.
/// Returns the number of decoded symbols.
///
/// ```
/// use binseq::{codec, EncodingMode};
///
/// let mut sequence = Vec::new();
/// let n = codec::unpack(&[0b1110_0100], 4, EncodingMode::TwoBit, &mut sequence).unwrap();
/// assert_eq!(n, 4);
/// assert_eq!(sequence, b"ACGT");
/// ```
pub fn unpack(
    packed: &[u8],
    num_symbols: usize,
    mode: EncodingMode,
    out: &mut Vec<u8>,
) -> Result<usize> {
    out.clear();
    out.resize(num_symbols, 0);
    match unpack_into(packed, num_symbols, mode, out) {
        Ok(n) => Ok(n),
        Err(e) => {
            out.clear();
            Err(e)
        }
    }
}

/// Unpacks `num_symbols` symbols into a caller-provided slice
///
/// Never allocates. Returns the number of decoded symbols.
///
/// # Errors
///
/// * [`EncodingError::ShortBuffer`] if `packed` holds fewer than `packed_len(num_symbols)`
///   bytes or if `out` is shorter than `num_symbols`
/// * [`EncodingError::InvalidCode`] on a four-bit code without a symbol
pub fn unpack_into(
    packed: &[u8],
    num_symbols: usize,
    mode: EncodingMode,
    out: &mut [u8],
) -> Result<usize> {
    let expected = mode.packed_len(num_symbols);
    if packed.len() < expected {
        return Err(EncodingError::ShortBuffer {
            expected,
            got: packed.len(),
        }
        .into());
    }
    if out.len() < num_symbols {
        return Err(EncodingError::ShortBuffer {
            expected: num_symbols,
            got: out.len(),
        }
        .into());
    }

    let out = &mut out[..num_symbols];
    match mode {
        EncodingMode::TwoBit => unpack_two_bit(packed, out),
        EncodingMode::FourBit => unpack_generic(packed, mode, out)?,
    }
    Ok(num_symbols)
}

/// Every two-bit pattern has a symbol so this path cannot fail
fn unpack_two_bit(packed: &[u8], out: &mut [u8]) {
    let last_byte = out.len() / 4;
    let mut chunks = out.chunks_exact_mut(4);
    for (dst, &byte) in chunks.by_ref().zip(packed) {
        dst.copy_from_slice(&TWO_BIT_BYTE_DECODING[byte as usize]);
    }
    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let byte = packed[last_byte];
        let len = tail.len();
        tail.copy_from_slice(&TWO_BIT_BYTE_DECODING[byte as usize][..len]);
    }
}

fn unpack_generic(packed: &[u8], mode: EncodingMode, out: &mut [u8]) -> Result<()> {
    let table = mode.decoding_table();
    let width = mode.bits_per_symbol();
    let per_byte = mode.symbols_per_byte();
    let mask = mode.mask();
    for (chunk_idx, (dst, &byte)) in out.chunks_mut(per_byte).zip(packed).enumerate() {
        for (offset, slot) in dst.iter_mut().enumerate() {
            let code = (byte >> (offset * width)) & mask;
            let symbol = table[code as usize];
            if symbol == 0 {
                return Err(EncodingError::InvalidCode {
                    code,
                    position: chunk_idx * per_byte + offset,
                }
                .into());
            }
            *slot = symbol;
        }
    }
    Ok(())
}

#[cfg(test)]
mod testing {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::Error;

    fn random_sequence(rng: &mut SmallRng, alphabet: &[u8], len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect()
    }

    #[test]
    fn test_packed_len() {
        assert_eq!(EncodingMode::TwoBit.packed_len(0), 0);
        assert_eq!(EncodingMode::TwoBit.packed_len(4), 1);
        assert_eq!(EncodingMode::TwoBit.packed_len(150), 38);
        assert_eq!(EncodingMode::FourBit.packed_len(1), 1);
        assert_eq!(EncodingMode::FourBit.packed_len(150), 75);
    }

    #[test]
    fn test_mode_tags() -> Result<()> {
        assert_eq!(u8::from(EncodingMode::TwoBit), 2);
        assert_eq!(u8::from(EncodingMode::FourBit), 4);
        assert_eq!(EncodingMode::try_from(2)?, EncodingMode::TwoBit);
        assert_eq!(EncodingMode::try_from(4)?, EncodingMode::FourBit);
        assert!(matches!(
            EncodingMode::try_from(3),
            Err(FormatError::InvalidEncodingMode(3))
        ));
        Ok(())
    }

    #[test]
    fn test_two_bit_layout() -> Result<()> {
        let mut packed = Vec::new();
        pack(b"TTTT", EncodingMode::TwoBit, &mut packed)?;
        assert_eq!(packed, vec![0xFF]);

        // trailing bits of the last byte stay zero
        pack(b"ACGTT", EncodingMode::TwoBit, &mut packed)?;
        assert_eq!(packed, vec![0b1110_0100, 0b0000_0011]);
        Ok(())
    }

    #[test]
    fn test_four_bit_layout() -> Result<()> {
        let mut packed = Vec::new();
        pack(b"ACN", EncodingMode::FourBit, &mut packed)?;
        assert_eq!(packed, vec![0x21, 0x0F]);
        Ok(())
    }

    #[test]
    fn test_every_symbol_round_trips() -> Result<()> {
        let mut packed = Vec::new();
        let mut unpacked = Vec::new();
        for (mode, alphabet) in [
            (EncodingMode::TwoBit, &TWO_BIT_SYMBOLS[..]),
            (EncodingMode::FourBit, &FOUR_BIT_SYMBOLS[1..]),
        ] {
            for &symbol in alphabet {
                pack(&[symbol], mode, &mut packed)?;
                unpack(&packed, 1, mode, &mut unpacked)?;
                assert_eq!(unpacked, vec![symbol]);
            }
        }
        Ok(())
    }

    #[test]
    fn test_random_round_trip() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut packed = Vec::new();
        let mut unpacked = Vec::new();
        for len in [1, 3, 4, 5, 31, 32, 33, 150, 301] {
            let seq = random_sequence(&mut rng, b"ACGT", len);
            pack(&seq, EncodingMode::TwoBit, &mut packed)?;
            assert_eq!(unpack(&packed, len, EncodingMode::TwoBit, &mut unpacked)?, len);
            assert_eq!(unpacked, seq);

            let seq = random_sequence(&mut rng, b"ACGTNRYKMSWBDHV", len);
            pack(&seq, EncodingMode::FourBit, &mut packed)?;
            assert_eq!(unpack(&packed, len, EncodingMode::FourBit, &mut unpacked)?, len);
            assert_eq!(unpacked, seq);
        }
        Ok(())
    }

    #[test]
    fn test_invalid_symbol() {
        let mut packed = vec![1, 2, 3];
        let err = pack(b"ACNT", EncodingMode::TwoBit, &mut packed).unwrap_err();
        assert!(matches!(
            err,
            Error::EncodingError(EncodingError::InvalidSymbol {
                symbol: b'N',
                position: 2
            })
        ));
        assert!(packed.is_empty());

        // lowercase is outside of both alphabets
        assert!(pack(b"acgt", EncodingMode::TwoBit, &mut packed).is_err());
        assert!(pack(b"acgt", EncodingMode::FourBit, &mut packed).is_err());
    }

    #[test]
    fn test_is_valid() {
        assert!(EncodingMode::TwoBit.is_valid(b"ACGTACGT"));
        assert!(!EncodingMode::TwoBit.is_valid(b"ACGTN"));
        assert!(EncodingMode::FourBit.is_valid(b"ACGTN"));
        assert!(!EncodingMode::FourBit.is_valid(b"ACGTX"));
    }

    #[test]
    fn test_invalid_four_bit_code() {
        let mut unpacked = Vec::new();
        let err = unpack(&[0x01], 2, EncodingMode::FourBit, &mut unpacked).unwrap_err();
        assert!(matches!(
            err,
            Error::EncodingError(EncodingError::InvalidCode {
                code: 0,
                position: 1
            })
        ));
        assert!(unpacked.is_empty());
    }

    #[test]
    fn test_short_packed_buffer() {
        let mut unpacked = Vec::new();
        let err = unpack(&[0xFF], 5, EncodingMode::TwoBit, &mut unpacked).unwrap_err();
        assert!(matches!(
            err,
            Error::EncodingError(EncodingError::ShortBuffer {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_unpack_into_slice() -> Result<()> {
        let mut out = [0u8; 8];
        let n = unpack_into(&[0b1110_0100, 0b0000_0011], 5, EncodingMode::TwoBit, &mut out)?;
        assert_eq!(&out[..n], b"ACGTT");

        let mut small = [0u8; 2];
        assert!(unpack_into(&[0xFF], 4, EncodingMode::TwoBit, &mut small).is_err());
        Ok(())
    }

    #[test]
    fn test_unpack_reuses_capacity() -> Result<()> {
        let mut packed = Vec::new();
        let mut unpacked = Vec::with_capacity(64);
        let capacity = unpacked.capacity();
        pack(b"ACGTACGTAC", EncodingMode::TwoBit, &mut packed)?;
        for _ in 0..10 {
            unpack(&packed, 10, EncodingMode::TwoBit, &mut unpacked)?;
        }
        assert_eq!(unpacked.capacity(), capacity);
        Ok(())
    }
}
