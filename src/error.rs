/// Custom Result type for binseq operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the binseq library, encompassing all possible error cases
/// that can occur during binary sequence operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors raised while opening or mapping a file
    #[error(transparent)]
    OpenError(#[from] OpenError),
    /// Errors related to the file header or the overall file layout
    #[error(transparent)]
    FormatError(#[from] FormatError),
    /// Errors that occur during read operations
    #[error(transparent)]
    ReadError(#[from] ReadError),
    /// Errors raised by the nucleotide codec
    #[error(transparent)]
    EncodingError(#[from] EncodingError),
    /// Errors that occur during write operations
    #[error(transparent)]
    WriteError(#[from] WriteError),
    /// Errors from the builder types
    #[error(transparent)]
    BuilderError(#[from] BuilderError),
    /// Standard I/O errors from the Rust standard library
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),
    /// A worker thread panicked during parallel processing
    #[error("A worker thread panicked during parallel processing")]
    ThreadPanic,
    /// Generic errors that can occur in any part of the system
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Checks if the error is an index out of range error
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::ReadError(ReadError::OutOfRange(_, _)))
    }

    /// Checks if the error describes a malformed or corrupted file
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::FormatError(_))
    }
}

/// Errors raised while opening a file for reading
#[derive(thiserror::Error, Debug)]
pub enum OpenError {
    /// The file could not be opened or mapped (missing path, permissions, mapping failure)
    #[error("Unable to open file: {0}")]
    Io(#[from] std::io::Error),

    /// The file being read is not a regular file (e.g., it might be a directory or special file)
    #[error("File is not regular")]
    IncompatibleFile,
}

/// Errors specific to processing and validating binary sequence headers and file layout
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The magic number in the header does not match the expected value
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0}")]
    InvalidMagicNumber(u32),

    /// The format version in the header is not supported
    ///
    /// # Arguments
    /// * `u8` - The unsupported version number that was found
    #[error("Invalid format version: {0}")]
    InvalidFormatVersion(u8),

    /// The primary sequence length must be greater than zero
    #[error("Invalid primary sequence length: 0")]
    InvalidSlen,

    /// The encoding mode tag in the header is not recognized
    #[error("Invalid encoding mode: {0}. Expected 2 or 4")]
    InvalidEncodingMode(u8),

    /// The buffer is too small to hold a header
    ///
    /// # Arguments
    /// * First `usize` - The actual number of bytes provided
    /// * Second `usize` - The expected number of bytes
    #[error("Invalid number of bytes provided: {0}. Expected: {1}")]
    InvalidSize(usize, usize),

    /// The number of bytes following the header does not match the record count and stride
    #[error("File size ({got}) does not match the header ({expected}) - possibly truncated or corrupted")]
    FileSizeMismatch { expected: usize, got: usize },

    /// The header declares more records than a file could address
    #[error("Record count ({0}) overflows the addressable file size")]
    RecordCountOverflow(u64),

    /// A stream ended with a different number of records than the header declared
    #[error("Stream contained {got} records but the header declared {expected}")]
    RecordCountMismatch { expected: u64, got: u64 },
}

/// Errors that can occur while reading binary sequence data
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// Attempted to access a record index that is beyond the available range
    ///
    /// # Arguments
    /// * First `usize` - The requested record index
    /// * Second `usize` - The number of records in the file
    #[error("Requested record index ({0}) is out of record range ({1})")]
    OutOfRange(usize, usize),

    /// A record range whose start lies past its end
    #[error("Invalid record range: {0}..{1}")]
    InvalidRange(usize, usize),

    /// Attempted to decode the extended sequence of a record without one
    #[error("Record {0} does not carry an extended sequence")]
    NotPaired(u64),

    /// The stream ended in the middle of a record
    #[error("Stream ended with a partial record ({0} bytes)")]
    PartialRecord(usize),

    /// No more bytes are available from the underlying stream
    #[error("End of stream reached")]
    EndOfStream,
}

/// Errors raised while packing or unpacking nucleotides
#[derive(thiserror::Error, Debug)]
pub enum EncodingError {
    /// A symbol outside the active alphabet was found while packing
    #[error("Invalid symbol (0x{symbol:02x}) at position {position}")]
    InvalidSymbol { symbol: u8, position: usize },

    /// A bit pattern with no assigned symbol was found while unpacking
    #[error("Invalid code ({code}) at position {position}")]
    InvalidCode { code: u8, position: usize },

    /// The provided buffer cannot hold the requested number of symbols
    #[error("Buffer of {got} bytes is too short. Expected at least {expected}")]
    ShortBuffer { expected: usize, got: usize },
}

/// Errors that can occur while writing binary sequence data
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// The length of the sequence being written does not match what was specified in the header
    ///
    /// # Fields
    /// * `expected` - The sequence length specified in the header
    /// * `got` - The actual length of the sequence being written
    #[error("Sequence length ({got}) does not match the header ({expected})")]
    UnexpectedSequenceLength { expected: u32, got: usize },

    /// The sequence contains invalid nucleotide characters
    ///
    /// # Arguments
    /// * `String` - The offending sequence
    #[error("Invalid nucleotides found in sequence: {0}")]
    InvalidNucleotideSequence(String),

    /// Attempted to write data without first setting up the header
    #[error("Missing header in writer builder")]
    MissingHeader,

    /// A single record was written to a paired file
    #[error("Header expects paired records (xlen = {0}) but a single record was provided")]
    MissingExtended(u32),

    /// A paired record was written to a single-end file
    #[error("Header expects single records but a paired record was provided")]
    UnexpectedExtended,

    /// An earlier write failed part-way, so the output ends in a partial record
    #[error("Output holds a partially written record")]
    IncompleteRecord,
}

/// Errors raised by the builder types
#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    /// The primary sequence length was never set
    #[error("Missing primary sequence length (slen) in header builder")]
    MissingSlen,
}
