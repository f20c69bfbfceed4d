//! Record views and layout
//!
//! A record on disk is laid out as:
//!
//! ```text
//! [flag: u64 LE][primary: sbytes][extended: xbytes, only if xlen > 0]
//! ```
//!
//! [`RefRecord`] borrows one such region without copying it.

use byteorder::{ByteOrder, LittleEndian};

use crate::codec::{self, EncodingMode};
use crate::context::DecodeContext;
use crate::error::{ReadError, Result};
use crate::header::{BinseqHeader, SIZE_FLAG};

/// Flag bit set on every record that carries a valid extended sequence
pub const PAIRED_FLAG: u64 = 1;

/// Configuration for binary sequence record layout
///
/// Translates the sequence lengths of a header into byte spans so that the
/// position of any record is a single multiplication away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordConfig {
    /// The primary sequence length in base pairs
    slen: u64,
    /// The extended sequence length in base pairs
    xlen: u64,
    /// The number of packed bytes of the primary sequence
    sbytes: usize,
    /// The number of packed bytes of the extended sequence
    xbytes: usize,
    /// The encoding mode of the packed sequences
    mode: EncodingMode,
}
impl RecordConfig {
    #[must_use]
    pub fn new(slen: usize, xlen: usize, mode: EncodingMode) -> Self {
        Self {
            slen: slen as u64,
            xlen: xlen as u64,
            sbytes: mode.packed_len(slen),
            xbytes: mode.packed_len(xlen),
            mode,
        }
    }

    #[must_use]
    pub fn from_header(header: &BinseqHeader) -> Self {
        Self::new(header.slen as usize, header.xlen as usize, header.mode)
    }

    /// Whether records carry an extended sequence
    #[must_use]
    pub fn paired(&self) -> bool {
        self.xlen > 0
    }

    #[must_use]
    pub fn slen(&self) -> usize {
        self.slen as usize
    }

    #[must_use]
    pub fn xlen(&self) -> usize {
        self.xlen as usize
    }

    #[must_use]
    pub fn sbytes(&self) -> usize {
        self.sbytes
    }

    #[must_use]
    pub fn xbytes(&self) -> usize {
        self.xbytes
    }

    #[must_use]
    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Returns the full record size in bytes: flag + sbytes + xbytes
    #[must_use]
    pub fn record_size_bytes(&self) -> usize {
        SIZE_FLAG + self.sbytes + self.xbytes
    }
}

/// Shared behavior of record views
pub trait BinseqRecord {
    /// Returns the global index of the record.
    fn index(&self) -> u64;

    /// Returns the flag value of this record
    fn flag(&self) -> u64;

    /// Returns the length of the primary sequence of this record
    fn slen(&self) -> u64;

    /// Returns the length of the extended sequence of this record
    fn xlen(&self) -> u64;

    /// Returns the encoding mode of the packed sequences
    fn mode(&self) -> EncodingMode;

    /// Returns a reference to the **encoded** primary sequence of this record
    fn sbuf(&self) -> &[u8];

    /// Returns a reference to the **encoded** extended sequence of this record.
    ///
    /// Empty if no extended sequence is present.
    fn xbuf(&self) -> &[u8];

    /// A convenience function to check if the record is paired.
    ///
    /// Pairedness is a property of the file: every record of a file with
    /// `xlen > 0` carries an extended sequence.
    fn is_paired(&self) -> bool {
        self.xlen() > 0
    }

    /// Decodes the primary sequence of this record into the provided buffer.
    ///
    /// The buffer is cleared before decoding.
    fn decode_s(&self, buf: &mut Vec<u8>) -> Result<usize> {
        codec::unpack(self.sbuf(), self.slen() as usize, self.mode(), buf)
    }

    /// Decodes the extended sequence of this record into the provided buffer.
    ///
    /// The buffer is cleared before decoding.
    fn decode_x(&self, buf: &mut Vec<u8>) -> Result<usize> {
        if !self.is_paired() {
            return Err(ReadError::NotPaired(self.index()).into());
        }
        codec::unpack(self.xbuf(), self.xlen() as usize, self.mode(), buf)
    }

    /// Decodes the primary sequence into the context's primary buffer
    ///
    /// Returns the number of decoded nucleotides (always `slen`).
    fn decode_primary(&self, ctx: &mut DecodeContext) -> Result<usize> {
        self.decode_s(ctx.sbuf_mut())
    }

    /// Decodes the extended sequence into the context's extended buffer
    ///
    /// Returns the number of decoded nucleotides (always `xlen`).
    ///
    /// # Errors
    ///
    /// Fails with [`ReadError::NotPaired`] if the record has no extended sequence.
    fn decode_extended(&self, ctx: &mut DecodeContext) -> Result<usize> {
        self.decode_x(ctx.xbuf_mut())
    }
}

/// A reference to a binary sequence record
///
/// This struct provides a view into a single record within a binary sequence file,
/// allowing access to the record's components without copying them.
/// It borrows from the reader that produced it and so cannot outlive it.
#[derive(Debug, Clone, Copy)]
pub struct RefRecord<'a> {
    /// The position (index) of this record in the file (0-based record index, not byte offset)
    id: u64,
    /// The underlying bytes of the record (flag included)
    buffer: &'a [u8],
    /// The configuration that defines the layout and size of record components
    config: RecordConfig,
}
impl<'a> RefRecord<'a> {
    /// Creates a new record reference
    ///
    /// # Panics
    ///
    /// Panics if the buffer length doesn't match the record size of the config
    #[must_use]
    pub fn new(id: u64, buffer: &'a [u8], config: RecordConfig) -> Self {
        assert_eq!(buffer.len(), config.record_size_bytes());
        Self { id, buffer, config }
    }

    /// Returns the record's configuration
    #[must_use]
    pub fn config(&self) -> RecordConfig {
        self.config
    }

    /// Returns the raw bytes of the record, flag included
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buffer
    }
}

impl BinseqRecord for RefRecord<'_> {
    fn index(&self) -> u64 {
        self.id
    }
    fn flag(&self) -> u64 {
        LittleEndian::read_u64(&self.buffer[..SIZE_FLAG])
    }
    fn slen(&self) -> u64 {
        self.config.slen
    }
    fn xlen(&self) -> u64 {
        self.config.xlen
    }
    fn mode(&self) -> EncodingMode {
        self.config.mode
    }
    fn sbuf(&self) -> &[u8] {
        &self.buffer[SIZE_FLAG..SIZE_FLAG + self.config.sbytes]
    }
    fn xbuf(&self) -> &[u8] {
        &self.buffer[SIZE_FLAG + self.config.sbytes..]
    }
}
