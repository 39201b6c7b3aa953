use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;

use crate::format::{Deformatter, MSGPACK};
use crate::primitives::StructureScan;
use crate::{DecodeError, DecodeResult, Reader, StreamingReader};

// -----------------------------------------------------------------------------
// RentalError

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RentalError {
    #[error("rented reader consumed {consumed} of the {rented} bytes it was given")]
    PartiallyConsumed { consumed: usize, rented: usize },
}

// -----------------------------------------------------------------------------
// IncrementalReader

/// Transport buffer for input that arrives in pieces.
///
/// The caller appends chunks with [`feed`](Self::feed). Whenever the next
/// complete top-level value is buffered, [`rent`](Self::rent) hands out a
/// [`RentedReader`] over exactly those bytes. The rental borrows the
/// transport mutably, so at most one reader is outstanding at a time, and
/// its bytes are only released once it is handed back with
/// [`RentedReader::return_reader`].
///
/// # Examples
///
/// ```
/// use mp_codec::IncrementalReader;
///
/// let mut input = IncrementalReader::new();
/// input.feed(&[0x92, 0x01]);
/// assert!(input.rent().unwrap().is_none());
///
/// input.feed(&[0x02]);
/// let mut rented = input.rent().unwrap().unwrap();
/// assert_eq!(rented.reader().read_array_header().unwrap(), 2);
/// rented.reader().skip().unwrap();
/// rented.reader().skip().unwrap();
/// rented.return_reader().unwrap();
/// assert!(input.is_empty());
/// ```
pub struct IncrementalReader {
    buffer: Vec<u8>,
    progress: Progress,
    deformatter: &'static dyn Deformatter,
    finished: bool,
}

/// Read position of an [`IncrementalReader`].
#[derive(Debug, Default)]
struct Progress {
    /// Released bytes still at the front of the buffer.
    consumed: usize,
    /// Released bytes since the first chunk, including compacted ones.
    released: usize,
    /// Measurement of the next value, relative to `consumed`.
    scan: StructureScan,
}

impl Progress {
    fn release(&mut self, count: usize) {
        self.consumed += count;
        self.released += count;
        self.scan = StructureScan::new();
    }
}

impl fmt::Debug for IncrementalReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalReader")
            .field("buffered", &self.buffered().len())
            .field("finished", &self.finished)
            .finish()
    }
}

impl Default for IncrementalReader {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalReader {
    pub fn new() -> Self {
        Self::with_deformatter(&MSGPACK)
    }

    pub fn with_deformatter(deformatter: &'static dyn Deformatter) -> Self {
        Self {
            buffer: Vec::new(),
            progress: Progress::default(),
            deformatter,
            finished: false,
        }
    }

    /// Appends a chunk of input.
    ///
    /// Bytes released by earlier rentals are dropped from the front of the
    /// buffer once they make up at least half of it.
    pub fn feed(&mut self, chunk: &[u8]) {
        let consumed = self.progress.consumed;
        if consumed > 0 && consumed * 2 >= self.buffer.len() {
            self.buffer.drain(..consumed);
            self.progress.consumed = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Marks the end of the input. No more chunks will be fed.
    #[inline]
    pub fn finish(&mut self) {
        self.finished = true;
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Unconsumed bytes.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.progress.consumed..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.progress.consumed >= self.buffer.len()
    }

    /// Bytes released since the first chunk. Offsets of errors raised by
    /// this transport count from the start of the input.
    #[inline]
    pub fn stream_position(&self) -> usize {
        self.progress.released
    }

    /// Bytes of the next value already measured by [`rent`](Self::rent).
    #[inline]
    pub fn scanned(&self) -> usize {
        self.progress.scan.scanned()
    }

    /// A tri-state cursor over the unconsumed bytes.
    ///
    /// Positions reported by the cursor are relative to the unconsumed
    /// bytes. Commit what was read with [`advance`](Self::advance).
    #[inline]
    pub fn cursor(&self) -> StreamingReader<'_> {
        StreamingReader::with_deformatter(self.buffered(), self.deformatter)
    }

    /// Releases `count` bytes read through a [`cursor`](Self::cursor).
    #[inline]
    pub fn advance(&mut self, count: usize) {
        let count = count.min(self.buffer.len() - self.progress.consumed);
        self.progress.release(count);
    }

    /// Length of the next complete value, if it is fully buffered.
    ///
    /// Resumes the measurement left by the previous call, so bytes are
    /// scanned once however the value is split into chunks.
    pub fn next_structure_len(&mut self) -> Result<DecodeResult<usize>, DecodeError> {
        let progress = &mut self.progress;
        progress
            .scan
            .resume(self.deformatter, &self.buffer[progress.consumed..])
            .map_err(|kind| DecodeError::new(kind, progress.released + progress.scan.scanned()))
    }

    /// Rents a reader over the next complete top-level value.
    ///
    /// Returns `Ok(None)` while the value is still incomplete. Fails if the
    /// buffered bytes can never form a valid value.
    pub fn rent(&mut self) -> Result<Option<RentedReader<'_>>, DecodeError> {
        let len = match self.next_structure_len()? {
            DecodeResult::Success(len) => len,
            DecodeResult::EmptyBuffer | DecodeResult::InsufficientBuffer => return Ok(None),
        };
        let start = self.progress.consumed;
        let window = &self.buffer[start..start + len];
        log::trace!("renting reader over {len} buffered bytes");
        Ok(Some(RentedReader {
            reader: Reader::with_deformatter(window, self.deformatter),
            progress: &mut self.progress,
            rented: len,
            returned: false,
        }))
    }
}

// -----------------------------------------------------------------------------
// RentedReader

/// A [`Reader`] over one complete value of an [`IncrementalReader`].
///
/// Must be handed back with [`return_reader`](Self::return_reader). Dropping
/// it without returning leaves the value in the transport, logs an error and
/// panics in debug builds.
pub struct RentedReader<'t> {
    reader: Reader<'t>,
    progress: &'t mut Progress,
    rented: usize,
    returned: bool,
}

impl fmt::Debug for RentedReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentedReader")
            .field("rented", &self.rented)
            .field("position", &self.reader.position())
            .finish()
    }
}

impl<'t> RentedReader<'t> {
    #[inline]
    pub fn reader(&mut self) -> &mut Reader<'t> {
        &mut self.reader
    }

    /// Number of bytes handed out by this rental.
    #[inline]
    pub fn len(&self) -> usize {
        self.rented
    }

    /// Hands the reader back, releasing the value it covered.
    ///
    /// The whole value must have been read. A partially read value stays in
    /// the transport and the rental is reported as misused.
    pub fn return_reader(mut self) -> Result<(), RentalError> {
        self.returned = true;
        let consumed = self.reader.position();
        if consumed != self.rented {
            return Err(RentalError::PartiallyConsumed {
                consumed,
                rented: self.rented,
            });
        }
        self.progress.release(consumed);
        Ok(())
    }
}

impl Drop for RentedReader<'_> {
    fn drop(&mut self) {
        if !self.returned {
            log::error!(
                "rented reader over {} bytes was dropped without being returned",
                self.rented
            );
            debug_assert!(
                std::thread::panicking(),
                "rented reader dropped without being returned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: [u8; 8] = [0x93, 0x01, 0xa1, b'x', 0xc0, 0xcd, 0x01, 0x00];

    #[test]
    fn byte_at_a_time_matches_whole() {
        let mut input = IncrementalReader::new();
        let mut seen = Vec::new();
        for &byte in &VALUES {
            input.feed(&[byte]);
            if let Some(mut rented) = input.rent().unwrap() {
                seen.push(rented.reader().read_raw().unwrap().to_vec());
                rented.return_reader().unwrap();
            }
        }
        assert_eq!(seen, [VALUES[..5].to_vec(), VALUES[5..].to_vec()]);
        assert!(input.is_empty());
    }

    #[test]
    fn partial_read_is_rejected() {
        let mut input = IncrementalReader::new();
        input.feed(&VALUES);
        let mut rented = input.rent().unwrap().unwrap();
        rented.reader().read_array_header().unwrap();
        assert_eq!(
            rented.return_reader(),
            Err(RentalError::PartiallyConsumed { consumed: 1, rented: 5 })
        );
        assert_eq!(input.buffered().len(), VALUES.len());
    }

    #[test]
    fn invalid_input_fails_rent() {
        let mut input = IncrementalReader::new();
        input.feed(&[0xc1]);
        assert!(input.rent().is_err());
    }

    #[test]
    fn scan_resumes_across_feeds() {
        // [[1, 2], "abc"]
        let value = [0x92, 0x92, 0x01, 0x02, 0xa3, b'a', b'b', b'c'];
        let mut input = IncrementalReader::new();
        let mut last = 0;
        for &byte in &value[..value.len() - 1] {
            input.feed(&[byte]);
            assert!(input.rent().unwrap().is_none());
            assert!(input.scanned() >= last);
            last = input.scanned();
        }
        // Everything but the unfinished string is measured.
        assert_eq!(input.scanned(), 4);

        input.feed(&value[value.len() - 1..]);
        let mut rented = input.rent().unwrap().unwrap();
        assert_eq!(rented.len(), value.len());
        rented.reader().skip().unwrap();
        rented.return_reader().unwrap();
        assert_eq!(input.scanned(), 0);
        assert_eq!(input.stream_position(), value.len());
    }

    #[test]
    fn error_offsets_count_from_stream_start() {
        let mut input = IncrementalReader::new();
        input.feed(&[0x01, 0x02]);
        for _ in 0..2 {
            let mut rented = input.rent().unwrap().unwrap();
            rented.reader().skip().unwrap();
            rented.return_reader().unwrap();
        }
        // The front of the buffer is compacted away here.
        input.feed(&[0x91, 0xc1]);
        let err = input.rent().unwrap_err();
        assert_eq!(err.kind, crate::DecodeErrorKind::ReservedCode);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn compaction_keeps_unconsumed_tail() {
        let mut input = IncrementalReader::new();
        input.feed(&[0x01, 0x02]);
        input.advance(1);
        input.feed(&[0x03]);
        assert_eq!(input.buffered(), [0x02, 0x03]);
    }

    #[test]
    #[should_panic(expected = "without being returned")]
    #[cfg(debug_assertions)]
    fn dropping_a_rental_panics_in_debug() {
        let mut input = IncrementalReader::new();
        input.feed(&[0xc0]);
        let _rented = input.rent().unwrap();
    }
}
