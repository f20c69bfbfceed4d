use std::ops::Range;
use std::sync::Arc;

use crate::error::ReadError;
use crate::{MmapReader, RefRecord, Result};

/// Default batch size for parallel processing
///
/// This constant defines how many records each thread processes between calls
/// to [`ParallelProcessor::on_batch_complete`].
pub const BATCH_SIZE: usize = 1024;

/// Trait for BINSEQ readers that can process records in parallel
///
/// This is implemented by the **reader** not by the **processor**.
/// For the **processor**, see the [`ParallelProcessor`] trait.
pub trait ParallelReader {
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()>;

    fn process_parallel_range<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
        range: Range<usize>,
    ) -> Result<()>;
}

/// Trait for types that can process records in parallel.
///
/// This is implemented by the **processor** not by the **reader**.
/// Each worker thread receives its own clone of the processor; decoding
/// buffers (for example a [`DecodeContext`](crate::DecodeContext)) belong in
/// the processor so that no thread shares them.
pub trait ParallelProcessor: Send + Clone {
    /// Process a single record
    fn process_record(&mut self, record: RefRecord<'_>) -> Result<()>;

    /// Called when a thread finishes processing its batch
    /// Default implementation does nothing
    fn on_batch_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Set the thread ID for this processor
    ///
    /// Each thread should call this method with its own unique ID.
    fn set_tid(&mut self, _tid: usize) {
        // Default implementation does nothing
    }

    /// Get the thread ID for this processor
    fn get_tid(&self) -> Option<usize> {
        None
    }
}

/// Parallel processing implementation for memory-mapped readers
impl ParallelReader for MmapReader {
    /// Processes all records in parallel using multiple threads
    ///
    /// A `num_threads` of zero uses every available CPU.
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()> {
        let num_records = self.num_records();
        self.process_parallel_range(processor, num_threads, 0..num_records)
    }

    /// Process records in parallel within a specified range
    ///
    /// The range is split into contiguous chunks, one per thread. The first error
    /// raised by any thread is returned once all threads have stopped.
    ///
    /// An empty range is a no-op. A range reaching past the last record fails with
    /// [`ReadError::OutOfRange`], a reversed one with [`ReadError::InvalidRange`].
    fn process_parallel_range<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
        range: Range<usize>,
    ) -> Result<()> {
        let num_threads = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads.min(num_cpus::get())
        };

        let num_records = self.num_records();
        if range.start > range.end {
            return Err(ReadError::InvalidRange(range.start, range.end).into());
        }
        if range.end > num_records {
            return Err(ReadError::OutOfRange(range.end, num_records).into());
        }
        if range.is_empty() {
            return Ok(());
        }

        let range_size = range.end - range.start;
        let records_per_thread = range_size.div_ceil(num_threads);

        let reader = Arc::new(self);

        let mut handles = Vec::new();
        for tid in 0..num_threads {
            let mut processor = processor.clone();
            let reader = Arc::clone(&reader);
            let range = range.clone();
            processor.set_tid(tid);

            let handle = std::thread::spawn(move || -> Result<()> {
                let start_idx = range.start + tid * records_per_thread;
                let end_idx = (start_idx + records_per_thread).min(range.end);

                for batch_start in (start_idx..end_idx).step_by(BATCH_SIZE) {
                    let batch_end = (batch_start + BATCH_SIZE).min(end_idx);
                    for idx in batch_start..batch_end {
                        processor.process_record(reader.get(idx)?)?;
                    }
                    processor.on_batch_complete()?;
                }

                Ok(())
            });

            handles.push(handle);
        }

        let mut first_error = None;
        for handle in handles {
            let outcome = handle.join().unwrap_or(Err(crate::Error::ThreadPanic));
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
