//! Header module for the binseq library
//!
//! This module provides the header structure and functionality for binary sequence files.
//! The header contains metadata about the binary sequence data, including format version,
//! sequence lengths, the encoding mode, and the number of records that follow.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Write};

use crate::codec::EncodingMode;
use crate::error::{BuilderError, FormatError, Result};
use crate::utils::expected_file_size;

/// Current magic number: "BSEQ" in ASCII (in little-endian byte order)
///
/// This is used to identify binary sequence files and verify file integrity.
#[allow(clippy::unreadable_literal)]
pub const MAGIC: u32 = 0x51455342;

/// Current format version of the binary sequence file format
pub const FORMAT: u8 = 3;

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 32;

/// Size of the per-record flag in bytes
pub const SIZE_FLAG: usize = 8;

/// Reserved bytes in the header
///
/// These bytes are reserved for future use and are not validated on read.
pub const RESERVED: [u8; 10] = [42; 10];

/// Byte offset of the record count within the header
pub(crate) const RECORD_COUNT_OFFSET: usize = 14;

#[derive(Debug, Clone, Copy, Default)]
pub struct BinseqHeaderBuilder {
    slen: Option<u32>,
    xlen: Option<u32>,
    mode: Option<EncodingMode>,
    record_count: Option<u64>,
}
impl BinseqHeaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn slen(mut self, slen: u32) -> Self {
        self.slen = Some(slen);
        self
    }
    #[must_use]
    pub fn xlen(mut self, xlen: u32) -> Self {
        self.xlen = Some(xlen);
        self
    }
    #[must_use]
    pub fn mode(mut self, mode: EncodingMode) -> Self {
        self.mode = Some(mode);
        self
    }
    #[must_use]
    pub fn record_count(mut self, record_count: u64) -> Self {
        self.record_count = Some(record_count);
        self
    }
    pub fn build(self) -> Result<BinseqHeader> {
        let Some(slen) = self.slen else {
            return Err(BuilderError::MissingSlen.into());
        };
        if slen == 0 {
            return Err(FormatError::InvalidSlen.into());
        }
        Ok(BinseqHeader {
            magic: MAGIC,
            format: FORMAT,
            slen,
            xlen: self.xlen.unwrap_or(0),
            mode: self.mode.unwrap_or_default(),
            record_count: self.record_count.unwrap_or(0),
            reserved: RESERVED,
        })
    }
}

/// Header structure for binary sequence files
///
/// The total size of this structure on disk is 32 bytes:
///
/// | Offset | Size | Field        |
/// | ------ | ---- | ------------ |
/// | 0      | 4    | magic        |
/// | 4      | 1    | format       |
/// | 5      | 4    | slen         |
/// | 9      | 4    | xlen         |
/// | 13     | 1    | mode         |
/// | 14     | 8    | record count |
/// | 22     | 10   | reserved     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinseqHeader {
    /// Magic number to identify the file format
    pub magic: u32,

    /// Version of the file format
    pub format: u8,

    /// Length of all primary sequences in the file
    pub slen: u32,

    /// Length of all extended sequences in the file (0 if single-end)
    pub xlen: u32,

    /// Number of bits per nucleotide
    pub mode: EncodingMode,

    /// Number of records following the header
    pub record_count: u64,

    /// Reserve remaining bytes for future use
    pub reserved: [u8; 10],
}
impl BinseqHeader {
    /// Creates a new single-end header with the specified sequence length
    #[must_use]
    pub fn new(mode: EncodingMode, slen: u32) -> Self {
        Self::new_extended(mode, slen, 0)
    }

    /// Creates a new header with both primary and extended sequence lengths
    ///
    /// # Arguments
    ///
    /// * `mode` - The number of bits per nucleotide
    /// * `slen` - The length of primary sequences in the file
    /// * `xlen` - The length of extended sequences in the file
    #[must_use]
    pub fn new_extended(mode: EncodingMode, slen: u32, xlen: u32) -> Self {
        Self {
            magic: MAGIC,
            format: FORMAT,
            slen,
            xlen,
            mode,
            record_count: 0,
            reserved: RESERVED,
        }
    }

    /// Checks if the file is paired
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.xlen > 0
    }

    /// Number of packed bytes of the primary sequence
    #[must_use]
    pub fn sbytes(&self) -> usize {
        self.mode.packed_len(self.slen as usize)
    }

    /// Number of packed bytes of the extended sequence
    #[must_use]
    pub fn xbytes(&self) -> usize {
        self.mode.packed_len(self.xlen as usize)
    }

    /// Size in bytes of a single record (flag + primary + extended)
    #[must_use]
    pub fn stride(&self) -> usize {
        SIZE_FLAG + self.sbytes() + self.xbytes()
    }

    /// Total number of bytes a file with this header occupies
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::RecordCountOverflow`] if the size does not fit in `usize`.
    pub fn file_size(&self) -> Result<usize> {
        usize::try_from(self.record_count)
            .ok()
            .and_then(|n| {
                expected_file_size(n, self.slen as usize, self.xlen as usize, self.mode)
            })
            .ok_or_else(|| FormatError::RecordCountOverflow(self.record_count).into())
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// Checks are ordered cheapest first: magic number, format version,
    /// primary sequence length, then the encoding mode.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The magic number is incorrect
    /// * The format version is unsupported
    /// * The primary sequence length is zero
    /// * The encoding mode tag is unknown
    pub fn from_bytes(buffer: &[u8; SIZE_HEADER]) -> Result<Self> {
        let magic = LittleEndian::read_u32(&buffer[0..4]);
        if magic != MAGIC {
            return Err(FormatError::InvalidMagicNumber(magic).into());
        }
        let format = buffer[4];
        if format != FORMAT {
            return Err(FormatError::InvalidFormatVersion(format).into());
        }
        let slen = LittleEndian::read_u32(&buffer[5..9]);
        if slen == 0 {
            return Err(FormatError::InvalidSlen.into());
        }
        let xlen = LittleEndian::read_u32(&buffer[9..13]);
        let mode = EncodingMode::try_from(buffer[13])?;
        let record_count = LittleEndian::read_u64(&buffer[RECORD_COUNT_OFFSET..22]);
        let mut reserved = [0u8; 10];
        reserved.copy_from_slice(&buffer[22..SIZE_HEADER]);
        Ok(Self {
            magic,
            format,
            slen,
            xlen,
            mode,
            record_count,
            reserved,
        })
    }

    /// Parses a header from the start of an arbitrarily sized buffer
    ///
    /// Only the leading `SIZE_HEADER` bytes are inspected.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is smaller than `SIZE_HEADER` or if the
    /// header data is invalid (see [`BinseqHeader::from_bytes`]).
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        let Some(bytes) = buffer.first_chunk::<SIZE_HEADER>() else {
            return Err(FormatError::InvalidSize(buffer.len(), SIZE_HEADER).into());
        };
        Self::from_bytes(bytes)
    }

    /// Parses the header of a complete file image and validates its length
    ///
    /// The buffer must hold exactly the header followed by `record_count` records.
    /// A partial trailing record, a missing record, or surplus bytes are all
    /// reported as corruption rather than silently truncated.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let header = Self::from_buffer(buffer)?;
        let expected = header.file_size()?;
        if buffer.len() != expected {
            return Err(FormatError::FileSizeMismatch {
                expected,
                got: buffer.len(),
            }
            .into());
        }
        Ok(header)
    }

    /// Serializes the header into a fixed-size byte array
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIZE_HEADER] {
        let mut buffer = [0u8; SIZE_HEADER];
        LittleEndian::write_u32(&mut buffer[0..4], self.magic);
        buffer[4] = self.format;
        LittleEndian::write_u32(&mut buffer[5..9], self.slen);
        LittleEndian::write_u32(&mut buffer[9..13], self.xlen);
        buffer[13] = self.mode.into();
        LittleEndian::write_u64(&mut buffer[RECORD_COUNT_OFFSET..22], self.record_count);
        buffer[22..SIZE_HEADER].copy_from_slice(&self.reserved);
        buffer
    }

    /// Writes the header to a writer
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the writer fails (typically an I/O error).
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Reads a header from a reader
    ///
    /// This method reads exactly `SIZE_HEADER` bytes from the provided reader and
    /// parses them into a header structure.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buffer = [0u8; SIZE_HEADER];
        reader.read_exact(&mut buffer)?;
        Self::from_bytes(&buffer)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Error;

    fn example_header() -> BinseqHeader {
        let mut header = BinseqHeader::new_extended(EncodingMode::TwoBit, 4, 7);
        header.record_count = 3;
        header
    }

    #[test]
    fn test_bytes_round_trip() -> Result<()> {
        let header = example_header();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"BSEQ");
        assert_eq!(BinseqHeader::from_bytes(&bytes)?, header);

        let mut cursor = std::io::Cursor::new(Vec::new());
        header.write_bytes(&mut cursor)?;
        let inner = cursor.into_inner();
        assert_eq!(inner.len(), SIZE_HEADER);
        assert_eq!(BinseqHeader::from_reader(&mut inner.as_slice())?, header);
        Ok(())
    }

    #[test]
    fn test_stride() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 4);
        assert_eq!(header.stride(), 9);
        assert!(!header.is_paired());

        let header = BinseqHeader::new_extended(EncodingMode::FourBit, 3, 3);
        assert_eq!(header.stride(), 8 + 2 + 2);
        assert!(header.is_paired());

        let header = example_header();
        assert_eq!(header.file_size()?, SIZE_HEADER + 3 * (8 + 1 + 2));
        Ok(())
    }

    #[test]
    fn test_builder() -> Result<()> {
        let header = BinseqHeaderBuilder::new()
            .slen(100)
            .xlen(50)
            .mode(EncodingMode::FourBit)
            .build()?;
        assert_eq!(header.slen, 100);
        assert_eq!(header.xlen, 50);
        assert_eq!(header.mode, EncodingMode::FourBit);
        assert_eq!(header.record_count, 0);

        assert!(matches!(
            BinseqHeaderBuilder::new().build(),
            Err(Error::BuilderError(BuilderError::MissingSlen))
        ));
        assert!(matches!(
            BinseqHeaderBuilder::new().slen(0).build(),
            Err(Error::FormatError(FormatError::InvalidSlen))
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = example_header().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            BinseqHeader::from_bytes(&bytes),
            Err(Error::FormatError(FormatError::InvalidMagicNumber(_)))
        ));
    }

    #[test]
    fn test_magic_checked_before_version() {
        let mut bytes = example_header().to_bytes();
        bytes[0] = 0;
        bytes[4] = 99;
        assert!(matches!(
            BinseqHeader::from_bytes(&bytes),
            Err(Error::FormatError(FormatError::InvalidMagicNumber(_)))
        ));
    }

    #[test]
    fn test_invalid_version() {
        let mut bytes = example_header().to_bytes();
        bytes[4] = FORMAT + 1;
        assert!(matches!(
            BinseqHeader::from_bytes(&bytes),
            Err(Error::FormatError(FormatError::InvalidFormatVersion(4)))
        ));
    }

    #[test]
    fn test_zero_slen() {
        let mut bytes = example_header().to_bytes();
        bytes[5..9].copy_from_slice(&[0; 4]);
        assert!(matches!(
            BinseqHeader::from_bytes(&bytes),
            Err(Error::FormatError(FormatError::InvalidSlen))
        ));
    }

    #[test]
    fn test_invalid_mode() {
        let mut bytes = example_header().to_bytes();
        bytes[13] = 8;
        assert!(matches!(
            BinseqHeader::from_bytes(&bytes),
            Err(Error::FormatError(FormatError::InvalidEncodingMode(8)))
        ));
    }

    #[test]
    fn test_short_buffer() {
        let bytes = example_header().to_bytes();
        assert!(matches!(
            BinseqHeader::from_buffer(&bytes[..20]),
            Err(Error::FormatError(FormatError::InvalidSize(20, SIZE_HEADER)))
        ));
    }

    #[test]
    fn test_parse_validates_size() -> Result<()> {
        let header = example_header();
        let mut image = header.to_bytes().to_vec();
        image.resize(header.file_size()?, 0);
        assert_eq!(BinseqHeader::parse(&image)?, header);

        // partial trailing record
        image.push(0);
        assert!(BinseqHeader::parse(&image).unwrap_err().is_format_error());

        // missing record
        image.truncate(header.file_size()? - header.stride());
        assert!(matches!(
            BinseqHeader::parse(&image),
            Err(Error::FormatError(FormatError::FileSizeMismatch { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_record_count_overflow() {
        let mut header = BinseqHeader::new(EncodingMode::TwoBit, 8);
        header.record_count = u64::MAX;
        assert!(matches!(
            header.file_size(),
            Err(Error::FormatError(FormatError::RecordCountOverflow(u64::MAX)))
        ));

        // a single 32-byte header claiming u64::MAX records
        assert!(matches!(
            BinseqHeader::parse(&header.to_bytes()),
            Err(Error::FormatError(FormatError::RecordCountOverflow(_)))
        ));

        // wraps to a small size under unchecked arithmetic
        header.record_count = (1 << 63) + 1;
        let mut image = header.to_bytes().to_vec();
        image.resize(SIZE_HEADER + header.stride(), 0);
        assert!(BinseqHeader::parse(&image).unwrap_err().is_format_error());
    }
}
