//! # binseq
//!
//! BINSEQ files store **fixed-length** nucleotide records in a flat binary layout:
//! a 32-byte header followed by records of identical size. Because every record
//! has the same stride, any record can be located in constant time and decoded
//! straight out of a memory-mapped file.
//!
//! Each record holds a 64-bit flag, a packed primary sequence and, for paired
//! files, a packed extended sequence. Sequences are packed either with two bits
//! per nucleotide (`ACGT`) or four bits per nucleotide (IUPAC codes including `N`).
//!
//! ## File layout
//!
//! | Section | Size                     | Description                               |
//! |---------|--------------------------|-------------------------------------------|
//! | header  | 32                       | See [`BinseqHeader`]                      |
//! | flag    | 8                        | Little-endian `u64`                       |
//! | primary | `ceil(slen * bits / 8)`  | Packed primary sequence                   |
//! | extended| `ceil(xlen * bits / 8)`  | Packed extended sequence (paired only)    |
//!
//! ## Usage
//!
//! ### Writing
//!
//! ```rust
//! use std::io::Cursor;
//! use binseq::{BinseqHeader, BinseqWriterBuilder, EncodingMode};
//!
//! let header = BinseqHeader::new_extended(EncodingMode::TwoBit, 4, 4);
//! let mut writer = BinseqWriterBuilder::default()
//!     .header(header)
//!     .build(Cursor::new(Vec::new()))
//!     .unwrap();
//!
//! writer.write_paired_record(0, b"ACGT", b"TTTT").unwrap();
//!
//! // Patches the record count into the header
//! let bytes = writer.finish().unwrap().into_inner();
//! assert_eq!(bytes.len(), 32 + 10);
//! ```
//!
//! ### Reading
//!
//! ```rust
//! # use std::io::{Cursor, Write};
//! # use binseq::{BinseqHeader, BinseqWriterBuilder, EncodingMode};
//! use binseq::{BinseqRecord, DecodeContext, MmapReader};
//!
//! # let header = BinseqHeader::new_extended(EncodingMode::TwoBit, 4, 4);
//! # let mut writer = BinseqWriterBuilder::default().header(header).build(Cursor::new(Vec::new())).unwrap();
//! # writer.write_paired_record(0, b"ACGT", b"TTTT").unwrap();
//! # let mut file = tempfile::NamedTempFile::new().unwrap();
//! # file.write_all(&writer.finish().unwrap().into_inner()).unwrap();
//! # let path = file.path();
//! let reader = MmapReader::new(path).unwrap();
//! let mut ctx = DecodeContext::new();
//!
//! let record = reader.get(0).unwrap();
//! record.decode_primary(&mut ctx).unwrap();
//! if record.is_paired() {
//!     record.decode_extended(&mut ctx).unwrap();
//! }
//! assert_eq!(ctx.sbuf(), b"ACGT");
//! assert_eq!(ctx.xbuf(), b"TTTT");
//! ```
//!
//! ### Parallel processing
//!
//! Records can be processed in parallel by implementing [`ParallelProcessor`]
//! and handing it to an [`MmapReader`] through the [`ParallelReader`] trait.

/// Nucleotide packing and unpacking
pub mod codec;

/// Reusable decoding buffers
mod context;

/// Error definitions
pub mod error;

/// File header definitions
mod header;

/// Parallel processing over memory-mapped files
mod parallel;

/// Invalid nucleotide policy
mod policy;

/// Memory-mapped and streaming readers
mod reader;

/// Record views and layout
mod record;

/// Utility functions
mod utils;

/// Record writers and encoders
mod writer;

pub use codec::EncodingMode;
pub use context::DecodeContext;
pub use error::{
    BuilderError, EncodingError, Error, FormatError, OpenError, ReadError, Result, WriteError,
};
pub use header::{BinseqHeader, BinseqHeaderBuilder, FORMAT, MAGIC, SIZE_FLAG, SIZE_HEADER};
pub use parallel::{ParallelProcessor, ParallelReader, BATCH_SIZE};
pub use policy::Policy;
pub use reader::{MmapReader, StreamReader};
pub use record::{BinseqRecord, RecordConfig, RefRecord, PAIRED_FLAG};
pub use utils::expected_file_size;
pub use writer::{BinseqWriter, BinseqWriterBuilder, Encoder};

/// Seed for the random number generator used by [`Policy::RandomDraw`]
pub const RNG_SEED: u64 = 42;
