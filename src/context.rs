use crate::{BinseqRecord, Result};

/// A context for storing reusable buffers for decoded sequence data.
///
/// Buffers grow to the sequence lengths of the first decoded record and are
/// cleared, never freed, on every subsequent decode. A context is independent
/// of any reader and is meant to be created once per decoding thread.
///
/// ```
/// use binseq::DecodeContext;
///
/// let ctx = DecodeContext::new();
/// assert!(ctx.sbuf().is_empty());
/// assert!(ctx.xbuf().is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DecodeContext {
    sbuf: Vec<u8>,
    xbuf: Vec<u8>,
}
impl DecodeContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose buffers never need to grow for the given lengths
    #[must_use]
    pub fn with_capacity(slen: usize, xlen: usize) -> Self {
        Self {
            sbuf: Vec::with_capacity(slen),
            xbuf: Vec::with_capacity(xlen),
        }
    }

    /// Buffer for primary sequence data
    #[inline]
    #[must_use]
    pub fn sbuf(&self) -> &[u8] {
        &self.sbuf
    }

    /// Mutable reference to primary sequence data
    #[inline]
    pub fn sbuf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.sbuf
    }

    /// Buffer for extended sequence data
    #[inline]
    #[must_use]
    pub fn xbuf(&self) -> &[u8] {
        &self.xbuf
    }

    /// Mutable reference to extended sequence data
    #[inline]
    pub fn xbuf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.xbuf
    }

    /// Clear all buffers
    pub fn clear(&mut self) {
        self.sbuf.clear();
        self.xbuf.clear();
    }

    /// Fill the context with the sequences of a record.
    ///
    /// The extended buffer is left empty for records without an extended sequence.
    pub fn fill<R: BinseqRecord>(&mut self, record: &R) -> Result<()> {
        self.clear();
        record.decode_primary(self)?;
        if record.is_paired() {
            record.decode_extended(self)?;
        }
        Ok(())
    }
}
