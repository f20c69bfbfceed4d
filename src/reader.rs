//! Binary sequence reader module
//!
//! This module provides functionality for reading binary sequence files using either:
//! 1. Memory mapping for random access to any record of a file
//! 2. Streaming for processing data sequentially as it arrives

use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};
use memmap2::Mmap;

use crate::codec::EncodingMode;
use crate::error::{Error, FormatError, OpenError, ReadError, Result};
use crate::header::{BinseqHeader, SIZE_HEADER};
use crate::record::{RecordConfig, RefRecord};

/// A memory-mapped reader for binary sequence files
///
/// The reader is the sole owner of the mapping and the parsed header. Records
/// are handed out as [`RefRecord`] views borrowing from the reader, so a view
/// can never outlive the mapping it points into.
///
/// The mapping is shared behind an `Arc`, which makes the reader `Send + Sync`:
/// many threads may call [`MmapReader::get`] on the same reader concurrently.
///
/// # Examples
///
/// ```no_run
/// use binseq::{BinseqRecord, DecodeContext, MmapReader, Result};
///
/// fn main() -> Result<()> {
///     let reader = MmapReader::new("./data/subset.bq")?;
///     let mut ctx = DecodeContext::new();
///
///     let record = reader.get(20)?;
///     record.decode_primary(&mut ctx)?;
///     if record.is_paired() {
///         record.decode_extended(&mut ctx)?;
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MmapReader {
    /// Memory mapped file contents, wrapped in Arc for thread-safe sharing
    mmap: Arc<Mmap>,

    /// Binary sequence file header containing format information
    header: BinseqHeader,

    /// Configuration defining the layout of records in the file
    config: RecordConfig,
}

impl MmapReader {
    /// Creates a new memory-mapped reader for a binary sequence file
    ///
    /// # Errors
    ///
    /// * [`OpenError`] if the file cannot be opened or mapped, or is not a regular file
    /// * [`FormatError`] if the header is invalid or the file size does not match
    ///   the header's record count and stride
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Verify input file is a file before attempting to map
        let file = File::open(path).map_err(OpenError::Io)?;
        if !file.metadata().map_err(OpenError::Io)?.is_file() {
            return Err(OpenError::IncompatibleFile.into());
        }

        // Safety: the file is open and the format assumes no concurrent writer
        let mmap = unsafe { Mmap::map(&file).map_err(OpenError::Io)? };

        // Validates the header and the total size of the mapping
        let header = BinseqHeader::parse(&mmap)?;
        let config = RecordConfig::from_header(&header);

        debug!(
            "Opened {}: slen={} xlen={} mode={:?} records={}",
            path.display(),
            header.slen,
            header.xlen,
            header.mode,
            header.record_count
        );

        Ok(Self {
            mmap: Arc::new(mmap),
            header,
            config,
        })
    }

    /// Returns the total number of records in the file
    #[must_use]
    pub fn num_records(&self) -> usize {
        self.header.record_count as usize
    }

    /// Returns a copy of the binary sequence file header
    #[must_use]
    pub fn header(&self) -> BinseqHeader {
        self.header
    }

    /// Returns the record layout of the file
    #[must_use]
    pub fn config(&self) -> RecordConfig {
        self.config
    }

    /// Returns the primary sequence length
    #[must_use]
    pub fn slen(&self) -> u32 {
        self.header.slen
    }

    /// Returns the extended sequence length (0 for single-end files)
    #[must_use]
    pub fn xlen(&self) -> u32 {
        self.header.xlen
    }

    /// Returns the encoding mode of the packed sequences
    #[must_use]
    pub fn mode(&self) -> EncodingMode {
        self.header.mode
    }

    /// Checks if the file has paired-records
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.header.is_paired()
    }

    /// Returns a reference to a specific record
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::OutOfRange`] if `idx >= num_records()`
    pub fn get(&self, idx: usize) -> Result<RefRecord<'_>> {
        if idx >= self.num_records() {
            return Err(ReadError::OutOfRange(idx, self.num_records()).into());
        }
        Ok(self.record_at(idx))
    }

    /// Iterates over every record of the file in order
    pub fn records(&self) -> impl Iterator<Item = RefRecord<'_>> + '_ {
        (0..self.num_records()).map(move |idx| self.record_at(idx))
    }

    /// Returns the raw bytes of a contiguous range of records
    ///
    /// Note: range 10..40 will return all bytes in the mmap between the record index 10 and 40
    pub fn get_buffer_slice(&self, range: Range<usize>) -> Result<&[u8]> {
        if range.start > range.end {
            return Err(ReadError::InvalidRange(range.start, range.end).into());
        }
        if range.end > self.num_records() {
            return Err(ReadError::OutOfRange(range.end, self.num_records()).into());
        }
        let rsize = self.config.record_size_bytes();
        let lbound = SIZE_HEADER + (range.start * rsize);
        let rbound = SIZE_HEADER + (range.end * rsize);
        Ok(&self.mmap[lbound..rbound])
    }

    /// Builds the view of an index already known to be in range
    fn record_at(&self, idx: usize) -> RefRecord<'_> {
        let rsize = self.config.record_size_bytes();
        let lbound = SIZE_HEADER + (idx * rsize);
        let rbound = lbound + rsize;
        RefRecord::new(idx as u64, &self.mmap[lbound..rbound], self.config)
    }
}

/// A reader for streaming binary sequence data from any source that implements Read
///
/// Unlike [`MmapReader`] which requires the entire file to be accessible at once,
/// `StreamReader` processes records sequentially as they become available, for
/// example from a pipe or a network connection.
///
/// The reader maintains an internal buffer and reconstructs records that span
/// multiple reads from the source.
pub struct StreamReader<R: Read> {
    /// The source reader for binary sequence data
    reader: R,

    /// Binary sequence file header containing format information
    header: Option<BinseqHeader>,

    /// Configuration defining the layout of records in the file
    config: Option<RecordConfig>,

    /// Buffer for storing incoming data
    buffer: Vec<u8>,

    /// Current position in the buffer
    buffer_pos: usize,

    /// Length of valid data in the buffer
    buffer_len: usize,

    /// Number of records yielded so far
    n_read: u64,
}

impl<R: Read> StreamReader<R> {
    /// Creates a new `StreamReader` with an 8K buffer
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 8192)
    }

    /// Creates a new `StreamReader` with a specified buffer capacity
    ///
    /// The buffer grows to hold at least one complete record if needed.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            header: None,
            config: None,
            buffer: vec![0; capacity.max(SIZE_HEADER)],
            buffer_pos: 0,
            buffer_len: 0,
            n_read: 0,
        }
    }

    /// Reads and validates the header from the underlying reader
    ///
    /// The header is cached, so repeated calls do not consume the stream.
    pub fn read_header(&mut self) -> Result<BinseqHeader> {
        if let Some(header) = self.header {
            return Ok(header);
        }

        while self.buffer_len - self.buffer_pos < SIZE_HEADER {
            match self.fill_buffer() {
                Ok(()) => {}
                Err(Error::ReadError(ReadError::EndOfStream)) => {
                    return Err(FormatError::InvalidSize(
                        self.buffer_len - self.buffer_pos,
                        SIZE_HEADER,
                    )
                    .into());
                }
                Err(e) => return Err(e),
            }
        }

        let header =
            BinseqHeader::from_buffer(&self.buffer[self.buffer_pos..self.buffer_pos + SIZE_HEADER])?;
        let config = RecordConfig::from_header(&header);
        self.buffer_pos += SIZE_HEADER;

        // guarantee a full record always fits in the buffer
        if self.buffer.len() < config.record_size_bytes() {
            self.buffer.resize(config.record_size_bytes(), 0);
        }

        trace!(
            "Read stream header: slen={} xlen={} records={}",
            header.slen,
            header.xlen,
            header.record_count
        );
        self.header = Some(header);
        self.config = Some(config);
        Ok(header)
    }

    /// Fills the internal buffer with more data from the reader
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::EndOfStream`] once the source is exhausted.
    fn fill_buffer(&mut self) -> Result<()> {
        // Move remaining data to beginning of buffer if needed
        if self.buffer_pos > 0 && self.buffer_pos < self.buffer_len {
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
            self.buffer_len -= self.buffer_pos;
            self.buffer_pos = 0;
        } else if self.buffer_pos == self.buffer_len {
            self.buffer_len = 0;
            self.buffer_pos = 0;
        }

        let bytes_read = self.reader.read(&mut self.buffer[self.buffer_len..])?;
        if bytes_read == 0 {
            return Err(ReadError::EndOfStream.into());
        }

        self.buffer_len += bytes_read;
        Ok(())
    }

    /// Checks that the stream holds nothing beyond the declared records
    fn check_exhausted(&mut self, expected: u64) -> Result<()> {
        if self.buffer_len > self.buffer_pos {
            return Err(FormatError::RecordCountMismatch {
                expected,
                got: expected + 1,
            }
            .into());
        }
        match self.fill_buffer() {
            Ok(()) => Err(FormatError::RecordCountMismatch {
                expected,
                got: expected + 1,
            }
            .into()),
            Err(Error::ReadError(ReadError::EndOfStream)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Retrieves the next record from the stream
    ///
    /// # Returns
    ///
    /// * `Some(Ok(RefRecord))` - The next record was successfully read
    /// * `None` - All records declared in the header were read
    /// * `Some(Err(Error))` - An I/O error occurred, the stream ended early, or it
    ///   holds data past the declared records
    pub fn next_record(&mut self) -> Option<Result<RefRecord<'_>>> {
        let header = match self.read_header() {
            Ok(header) => header,
            Err(e) => return Some(Err(e)),
        };
        let config = self.config?;
        let record_size = config.record_size_bytes();

        if self.n_read == header.record_count {
            return match self.check_exhausted(header.record_count) {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            };
        }

        // Ensure we have enough data for a complete record
        while self.buffer_len - self.buffer_pos < record_size {
            match self.fill_buffer() {
                Ok(()) => {}
                Err(Error::ReadError(ReadError::EndOfStream)) => {
                    let remaining = self.buffer_len - self.buffer_pos;
                    if remaining > 0 {
                        return Some(Err(ReadError::PartialRecord(remaining).into()));
                    }
                    return Some(Err(FormatError::RecordCountMismatch {
                        expected: header.record_count,
                        got: self.n_read,
                    }
                    .into()));
                }
                Err(e) => return Some(Err(e)),
            }
        }

        let record_start = self.buffer_pos;
        self.buffer_pos += record_size;
        let id = self.n_read;
        self.n_read += 1;

        let record_bytes = &self.buffer[record_start..record_start + record_size];
        Some(Ok(RefRecord::new(id, record_bytes, config)))
    }

    /// Consumes the stream reader and returns the inner reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod testing {
    use std::io::{Cursor, Write};

    use tempfile::NamedTempFile;

    use super::*;
    use crate::{BinseqRecord, BinseqWriterBuilder, DecodeContext};

    fn write_file(header: BinseqHeader, records: &[(&[u8], &[u8])]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        let mut writer = BinseqWriterBuilder::default()
            .header(header)
            .build(Cursor::new(Vec::new()))?;
        for (primary, extended) in records {
            if extended.is_empty() {
                writer.write_record(0, primary)?;
            } else {
                writer.write_paired_record(0, primary, extended)?;
            }
        }
        file.write_all(&writer.finish()?.into_inner())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_mmap_single() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 4);
        let file = write_file(header, &[(b"ACGT", b""), (b"TTTT", b"")])?;

        let reader = MmapReader::new(file.path())?;
        assert_eq!(reader.num_records(), 2);
        assert_eq!(reader.slen(), 4);
        assert_eq!(reader.xlen(), 0);
        assert!(!reader.is_paired());

        let mut ctx = DecodeContext::new();
        let record = reader.get(0)?;
        assert_eq!(record.decode_primary(&mut ctx)?, 4);
        assert_eq!(ctx.sbuf(), b"ACGT");

        reader.get(1)?.decode_primary(&mut ctx)?;
        assert_eq!(ctx.sbuf(), b"TTTT");

        assert!(reader.get(2).unwrap_err().is_out_of_range());
        assert!(reader.get(usize::MAX).unwrap_err().is_out_of_range());
        Ok(())
    }

    #[test]
    fn test_records_iterator() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::FourBit, 3);
        let file = write_file(header, &[(b"ACN", b""), (b"NNN", b""), (b"GTA", b"")])?;
        let reader = MmapReader::new(file.path())?;

        let mut ctx = DecodeContext::new();
        let mut decoded = Vec::new();
        for record in reader.records() {
            record.decode_primary(&mut ctx)?;
            decoded.push(ctx.sbuf().to_vec());
        }
        assert_eq!(decoded, vec![b"ACN".to_vec(), b"NNN".to_vec(), b"GTA".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_buffer_slice() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 4);
        let file = write_file(header, &[(b"ACGT", b""), (b"TTTT", b""), (b"AAAA", b"")])?;
        let reader = MmapReader::new(file.path())?;
        let stride = reader.config().record_size_bytes();

        assert_eq!(reader.get_buffer_slice(1..3)?.len(), 2 * stride);
        assert!(reader.get_buffer_slice(0..0)?.is_empty());
        assert!(reader.get_buffer_slice(2..4).unwrap_err().is_out_of_range());
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 2..1;
        assert!(matches!(
            reader.get_buffer_slice(reversed),
            Err(Error::ReadError(ReadError::InvalidRange(2, 1)))
        ));
        Ok(())
    }

    #[test]
    fn test_overflowing_record_count() -> Result<()> {
        let mut header = BinseqHeader::new(EncodingMode::TwoBit, 8);
        header.record_count = u64::MAX;
        let mut file = NamedTempFile::new()?;
        file.write_all(&header.to_bytes())?;
        file.flush()?;
        let err = MmapReader::new(file.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::FormatError(FormatError::RecordCountOverflow(u64::MAX))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = MmapReader::new("/this/path/does/not/exist.bq")
            .err()
            .expect("open should fail");
        assert!(matches!(err, Error::OpenError(OpenError::Io(_))));
    }

    #[test]
    fn test_directory_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = MmapReader::new(dir.path()).err().expect("open should fail");
        assert!(matches!(err, Error::OpenError(_)));
        Ok(())
    }

    #[test]
    fn test_empty_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        let err = MmapReader::new(file.path()).err().expect("open should fail");
        assert!(err.is_format_error());
        Ok(())
    }

    #[test]
    fn test_truncated_file() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 8);
        let file = write_file(header, &[(b"ACGTACGT", b""), (b"ACGTACGT", b"")])?;
        let len = file.as_file().metadata()?.len();
        file.as_file().set_len(len - 1)?;
        let err = MmapReader::new(file.path()).err().expect("open should fail");
        assert!(matches!(
            err,
            Error::FormatError(FormatError::FileSizeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_stream_reader() -> Result<()> {
        let header = BinseqHeader::new_extended(EncodingMode::TwoBit, 6, 5);
        let mut writer = BinseqWriterBuilder::default()
            .header(header)
            .build(Cursor::new(Vec::new()))?;
        for _ in 0..100 {
            writer.write_paired_record(7, b"ACGTAC", b"GGTTA")?;
        }
        let bytes = writer.finish()?.into_inner();

        // small capacity forces records to span multiple reads
        let mut reader = StreamReader::with_capacity(bytes.as_slice(), 8);
        assert_eq!(reader.read_header()?.record_count, 100);

        let mut ctx = DecodeContext::new();
        let mut n = 0;
        while let Some(record) = reader.next_record() {
            let record = record?;
            assert_eq!(record.index(), n);
            ctx.fill(&record)?;
            assert_eq!(ctx.sbuf(), b"ACGTAC");
            assert_eq!(ctx.xbuf(), b"GGTTA");
            n += 1;
        }
        assert_eq!(n, 100);
        Ok(())
    }

    #[test]
    fn test_stream_partial_record() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 4);
        let mut writer = BinseqWriterBuilder::default()
            .header(header)
            .build(Cursor::new(Vec::new()))?;
        writer.write_record(0, b"ACGT")?;
        writer.write_record(0, b"ACGT")?;
        let mut bytes = writer.finish()?.into_inner();
        bytes.pop();

        let mut reader = StreamReader::new(bytes.as_slice());
        assert!(reader.next_record().is_some_and(|r| r.is_ok()));
        assert!(matches!(
            reader.next_record(),
            Some(Err(Error::ReadError(ReadError::PartialRecord(8))))
        ));
        Ok(())
    }

    #[test]
    fn test_stream_surplus_records() -> Result<()> {
        let header = BinseqHeader::new(EncodingMode::TwoBit, 4);
        let mut writer = BinseqWriterBuilder::default()
            .header(header)
            .build(Cursor::new(Vec::new()))?;
        writer.write_record(0, b"ACGT")?;
        let mut bytes = writer.finish()?.into_inner();
        bytes.extend_from_slice(&[0u8; 9]);

        let mut reader = StreamReader::new(bytes.as_slice());
        assert!(reader.next_record().is_some_and(|r| r.is_ok()));
        assert!(matches!(
            reader.next_record(),
            Some(Err(Error::FormatError(
                FormatError::RecordCountMismatch { .. }
            )))
        ));
        Ok(())
    }

    #[test]
    fn test_stream_short_header() {
        let mut reader = StreamReader::new(&b"BSEQ"[..]);
        assert!(matches!(
            reader.next_record(),
            Some(Err(Error::FormatError(FormatError::InvalidSize(4, _))))
        ));
    }
}
