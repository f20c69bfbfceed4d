//! Binary sequence writer module
//!
//! This module provides functionality for writing nucleotide sequences to binary files.
//! It includes support for:
//! - Single and paired sequence writing
//! - Invalid nucleotide handling with configurable policies
//! - Headless mode for parallel writing
//!
//! The record count of the header is only known once writing is done, so it is
//! patched in place by [`BinseqWriter::finish`] on seekable outputs. When writing
//! to a sink that cannot seek, set the record count on the header up front and
//! use [`BinseqWriter::into_inner`] instead.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, warn};
use rand::{rngs::SmallRng, SeedableRng};

use crate::codec::{self, EncodingMode};
use crate::error::{Result, WriteError};
use crate::header::{BinseqHeader, RECORD_COUNT_OFFSET, SIZE_FLAG, SIZE_HEADER};
use crate::record::PAIRED_FLAG;
use crate::{Policy, RNG_SEED};

/// Encodes nucleotide sequences into their packed binary representation
///
/// The encoder maintains internal buffers to avoid repeated allocations during
/// encoding operations. These buffers are reused across multiple encode calls.
#[derive(Clone)]
pub struct Encoder {
    /// Header containing sequence lengths and the encoding mode
    header: BinseqHeader,

    /// Packed primary sequence
    sbuffer: Vec<u8>,
    /// Packed extended sequence
    xbuffer: Vec<u8>,

    /// Primary sequence after policy application
    s_ibuf: Vec<u8>,
    /// Extended sequence after policy application
    x_ibuf: Vec<u8>,

    /// Policy for handling invalid nucleotides during encoding
    policy: Policy,

    /// Random number generator for the `RandomDraw` policy
    rng: SmallRng,
}
impl Encoder {
    #[must_use]
    pub fn new(header: BinseqHeader) -> Self {
        Self::with_policy(header, Policy::default())
    }

    #[must_use]
    pub fn with_policy(header: BinseqHeader, policy: Policy) -> Self {
        Self {
            header,
            policy,
            sbuffer: Vec::default(),
            xbuffer: Vec::default(),
            s_ibuf: Vec::default(),
            x_ibuf: Vec::default(),
            rng: SmallRng::seed_from_u64(RNG_SEED),
        }
    }

    fn check_length(expected: u32, sequence: &[u8]) -> Result<()> {
        if sequence.len() != expected as usize {
            return Err(WriteError::UnexpectedSequenceLength {
                expected,
                got: sequence.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Packs one sequence, falling back to the policy if it holds invalid symbols
    ///
    /// Returns `false` if the policy drops the sequence.
    fn pack_with_policy(
        sequence: &[u8],
        mode: EncodingMode,
        policy: Policy,
        rng: &mut SmallRng,
        ibuf: &mut Vec<u8>,
        packed: &mut Vec<u8>,
    ) -> Result<bool> {
        if codec::pack(sequence, mode, packed).is_ok() {
            return Ok(true);
        }
        if !policy.handle(sequence, mode, ibuf, rng)? {
            return Ok(false);
        }
        codec::pack(ibuf, mode, packed)?;
        Ok(true)
    }

    /// Encodes a single sequence.
    ///
    /// Will return `None` if the sequence is invalid and the policy drops it.
    pub fn encode_single(&mut self, primary: &[u8]) -> Result<Option<&[u8]>> {
        if self.header.is_paired() {
            return Err(WriteError::MissingExtended(self.header.xlen).into());
        }
        Self::check_length(self.header.slen, primary)?;

        self.clear();
        if !Self::pack_with_policy(
            primary,
            self.header.mode,
            self.policy,
            &mut self.rng,
            &mut self.s_ibuf,
            &mut self.sbuffer,
        )? {
            return Ok(None);
        }

        Ok(Some(self.sbuffer.as_slice()))
    }

    /// Encodes a pair of sequences.
    ///
    /// The policy only sees the mate holding invalid symbols. Will return `None`
    /// if the policy drops either mate.
    pub fn encode_paired(
        &mut self,
        primary: &[u8],
        extended: &[u8],
    ) -> Result<Option<(&[u8], &[u8])>> {
        if !self.header.is_paired() {
            return Err(WriteError::UnexpectedExtended.into());
        }
        Self::check_length(self.header.slen, primary)?;
        Self::check_length(self.header.xlen, extended)?;

        let mode = self.header.mode;
        self.clear();
        if !Self::pack_with_policy(
            primary,
            mode,
            self.policy,
            &mut self.rng,
            &mut self.s_ibuf,
            &mut self.sbuffer,
        )? || !Self::pack_with_policy(
            extended,
            mode,
            self.policy,
            &mut self.rng,
            &mut self.x_ibuf,
            &mut self.xbuffer,
        )? {
            return Ok(None);
        }

        Ok(Some((self.sbuffer.as_slice(), self.xbuffer.as_slice())))
    }

    /// Clear all buffers
    pub fn clear(&mut self) {
        self.sbuffer.clear();
        self.xbuffer.clear();
        self.s_ibuf.clear();
        self.x_ibuf.clear();
    }
}

/// Builder for creating configured `BinseqWriter` instances
///
/// # Examples
///
/// ```
/// # use binseq::{BinseqHeaderBuilder, BinseqWriterBuilder, Policy, Result};
/// # fn main() -> Result<()> {
/// let header = BinseqHeaderBuilder::new().slen(100).build()?;
/// let writer = BinseqWriterBuilder::default()
///     .header(header)
///     .policy(Policy::SetToA)
///     .headless(false)
///     .build(Vec::new())?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BinseqWriterBuilder {
    /// Required header defining sequence lengths and format
    header: Option<BinseqHeader>,
    /// Optional policy for handling invalid nucleotides
    policy: Option<Policy>,
    /// Optional headless mode for parallel writing scenarios
    headless: Option<bool>,
}
impl BinseqWriterBuilder {
    #[must_use]
    pub fn header(mut self, header: BinseqHeader) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = Some(headless);
        self
    }

    pub fn build<W: Write>(self, inner: W) -> Result<BinseqWriter<W>> {
        let Some(header) = self.header else {
            return Err(WriteError::MissingHeader.into());
        };
        BinseqWriter::new(
            inner,
            header,
            self.policy.unwrap_or_default(),
            self.headless.unwrap_or(false),
        )
    }
}

/// High-level writer for binary sequence files
///
/// The writer can operate in two modes:
/// - Normal mode: Writes the header followed by records
/// - Headless mode: Writes only records (useful for parallel writing)
#[derive(Clone)]
pub struct BinseqWriter<W: Write> {
    /// The underlying writer for output
    inner: W,

    /// Encoder for converting sequences to binary format
    encoder: Encoder,

    /// When true, the header is not written to the output
    headless: bool,

    /// Number of records written (or ingested) so far
    num_records: u64,

    /// Bytes handed to `inner` since construction, header included
    written: u64,

    /// Set while a write is in flight; stays set if it failed part-way
    poisoned: bool,
}
impl<W: Write> BinseqWriter<W> {
    /// Creates a new `BinseqWriter`
    ///
    /// This is a low-level constructor; see [`BinseqWriterBuilder`].
    pub fn new(mut inner: W, header: BinseqHeader, policy: Policy, headless: bool) -> Result<Self> {
        let mut written = 0;
        if !headless {
            header.write_bytes(&mut inner)?;
            written = SIZE_HEADER as u64;
        }
        Ok(Self {
            inner,
            encoder: Encoder::with_policy(header, policy),
            headless,
            num_records: 0,
            written,
            poisoned: false,
        })
    }

    /// Writes a single record to the output
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the record was written
    /// * `Ok(false)` if the record was dropped by [`Policy::IgnoreSequence`]
    pub fn write_record(&mut self, flag: u64, primary: &[u8]) -> Result<bool> {
        let Some(sbuffer) = self.encoder.encode_single(primary)? else {
            warn!("Skipping record with invalid nucleotides");
            return Ok(false);
        };
        // poisoned stays set if the record is only partly written
        self.poisoned = true;
        self.inner.write_u64::<LittleEndian>(flag)?;
        self.inner.write_all(sbuffer)?;
        self.poisoned = false;
        self.written += (SIZE_FLAG + sbuffer.len()) as u64;
        self.num_records += 1;
        Ok(true)
    }

    /// Writes a paired record to the output
    ///
    /// The [`PAIRED_FLAG`] bit is always set on the written flag.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the record was written
    /// * `Ok(false)` if the record was dropped by [`Policy::IgnoreSequence`]
    pub fn write_paired_record(
        &mut self,
        flag: u64,
        primary: &[u8],
        extended: &[u8],
    ) -> Result<bool> {
        let Some((sbuffer, xbuffer)) = self.encoder.encode_paired(primary, extended)? else {
            warn!("Skipping paired record with invalid nucleotides");
            return Ok(false);
        };
        self.poisoned = true;
        self.inner.write_u64::<LittleEndian>(flag | PAIRED_FLAG)?;
        self.inner.write_all(sbuffer)?;
        self.inner.write_all(xbuffer)?;
        self.poisoned = false;
        self.written += (SIZE_FLAG + sbuffer.len() + xbuffer.len()) as u64;
        self.num_records += 1;
        Ok(true)
    }

    /// Returns the header this writer encodes against
    #[must_use]
    pub fn header(&self) -> BinseqHeader {
        self.encoder.header
    }

    /// Number of records written so far
    #[must_use]
    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    /// Consumes the writer and returns the underlying writer
    ///
    /// The header's record count is not updated.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Gets a mutable reference to the underlying writer
    pub fn by_ref(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Flushes any buffered data to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Creates a new encoder with the same configuration as this writer
    ///
    /// This is useful when you need a separate encoder instance for parallel
    /// processing.
    #[must_use]
    pub fn new_encoder(&self) -> Encoder {
        let mut encoder = self.encoder.clone();
        encoder.clear();
        encoder
    }

    /// Checks if this writer is in headless mode
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Ingests the contents of a headless writer's buffer
    ///
    /// Used in parallel writing scenarios to combine the output of multiple writers.
    /// The other writer's buffer and record count are reset.
    pub fn ingest(&mut self, other: &mut BinseqWriter<Vec<u8>>) -> Result<()> {
        self.poisoned = true;
        self.inner.write_all(&other.inner)?;
        self.poisoned = false;
        self.written += other.inner.len() as u64;
        self.num_records += other.num_records;
        other.inner.clear();
        other.num_records = 0;
        Ok(())
    }
}
impl<W: Write + Seek> BinseqWriter<W> {
    /// Flushes the writer, patches the header record count, and returns the inner writer
    ///
    /// The header is located from the bytes this writer produced, so the stream
    /// position must not be moved through [`BinseqWriter::by_ref`].
    /// The stream position is left at the end of the written data.
    ///
    /// # Errors
    ///
    /// [`WriteError::IncompleteRecord`] if an earlier write failed part-way.
    pub fn finish(mut self) -> Result<W> {
        if self.poisoned {
            return Err(WriteError::IncompleteRecord.into());
        }
        self.inner.flush()?;
        if !self.headless {
            let end = self.inner.stream_position()?;
            let Some(origin) = end.checked_sub(self.written) else {
                return Err(WriteError::IncompleteRecord.into());
            };
            self.inner
                .seek(SeekFrom::Start(origin + RECORD_COUNT_OFFSET as u64))?;
            self.inner.write_u64::<LittleEndian>(self.num_records)?;
            self.inner.seek(SeekFrom::Start(end))?;
            self.inner.flush()?;
        }
        debug!("Finished writing {} records", self.num_records);
        Ok(self.inner)
    }
}
