use crate::codec::EncodingMode;
use crate::header::{SIZE_FLAG, SIZE_HEADER};

/// Calculates the number of expected bytes in a binary sequence file
///
/// Single-end files pass an `xlen` of zero. Returns `None` if the size
/// overflows `usize`.
#[must_use]
pub fn expected_file_size(
    num_records: usize,
    slen: usize,
    xlen: usize,
    mode: EncodingMode,
) -> Option<usize> {
    // flag + packed primary + packed extended
    let record_size = SIZE_FLAG + mode.packed_len(slen) + mode.packed_len(xlen);

    num_records
        .checked_mul(record_size)?
        .checked_add(SIZE_HEADER)
}
