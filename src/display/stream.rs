//! Bookkeeping for incremental screen updates.
//!
//! Pushing a whole 1 KiB frame over 400 kHz I2C blocks for roughly 25 ms. The update cursor lets
//! the caller spread that over many short transfers of `1 << pow` bytes each: at 64 bytes a
//! transfer takes about 1.5 ms and a frame 16 calls. Smaller transfers keep the main loop more
//! responsive at the cost of per-transfer addressing overhead; larger ones raise throughput and
//! latency together.

use core::ops::Range;

/// Smallest transfer exponent (1 byte per transfer).
pub const MIN_TRANSFER_POW: u8 = 0;

/// Position of the next incremental transfer in the framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct UpdateCursor {
    offset: usize,
    pow: u8,
    max_pow: u8,
    size: usize,
}

impl UpdateCursor {
    /// A cursor at offset 0 for a `size` byte framebuffer.
    pub(crate) fn new(size: usize, pow: u8) -> Self {
        let mut max_pow = 0;
        while (1usize << max_pow) < size {
            max_pow += 1;
        }
        let mut cursor = UpdateCursor {
            offset: 0,
            pow: 0,
            max_pow,
            size,
        };
        cursor.set_pow(pow);
        cursor
    }

    /// Set the transfer exponent, clamped to `[MIN_TRANSFER_POW, max_pow]`. Returns the value in
    /// effect.
    pub(crate) fn set_pow(&mut self, pow: u8) -> u8 {
        self.pow = pow.max(MIN_TRANSFER_POW).min(self.max_pow);
        if self.pow != pow {
            debug!("transfer pow {=u8} clamped to {=u8}", pow, self.pow);
        }
        self.pow
    }

    pub(crate) fn pow(&self) -> u8 {
        self.pow
    }

    /// Largest exponent, the first whose transfer covers the whole framebuffer.
    pub(crate) fn max_pow(&self) -> u8 {
        self.max_pow
    }

    pub(crate) fn bytes_per_op(&self) -> usize {
        1 << self.pow
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Number of transfers of `bytes_per_op` that make up one frame.
    pub(crate) fn total_chunks(&self) -> usize {
        (self.size + self.bytes_per_op() - 1) / self.bytes_per_op()
    }

    /// Byte range of chunk `index`, or `None` past the last chunk.
    pub(crate) fn chunk(&self, index: usize) -> Option<Range<usize>> {
        let start = index.checked_mul(self.bytes_per_op())?;
        if start >= self.size {
            return None;
        }
        Some(start..self.size.min(start + self.bytes_per_op()))
    }

    /// Byte range the next tick transfers: up to `bytes_per_op`, never past the end.
    pub(crate) fn next(&self) -> Range<usize> {
        self.offset..self.size.min(self.offset + self.bytes_per_op())
    }

    /// Record a successful transfer of `len` bytes. Returns `true` when the cursor wrapped back
    /// to the start of the framebuffer.
    pub(crate) fn advance(&mut self, len: usize) -> bool {
        self.offset += len;
        if self.offset >= self.size {
            self.offset = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.offset = 0;
    }
}

/// A run of framebuffer bytes within a single page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub page: u8,
    /// Pixel column of the first byte, before any column offset.
    pub column: u8,
    pub bytes: Range<usize>,
}

/// Split a framebuffer byte range at page boundaries. Page addressing never carries the column
/// pointer into the next page, so each segment needs its own address.
pub(crate) fn segments(range: Range<usize>, width: u8) -> impl Iterator<Item = Segment> {
    let width = width as usize;
    let mut start = range.start;
    let end = range.end;
    core::iter::from_fn(move || {
        if start >= end {
            return None;
        }
        let page_end = (start / width + 1) * width;
        let seg_end = end.min(page_end);
        let seg = Segment {
            page: (start / width) as u8,
            column: (start % width) as u8,
            bytes: start..seg_end,
        };
        start = seg_end;
        Some(seg)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn pow_is_clamped() {
        let mut c = UpdateCursor::new(1024, 6);
        assert_eq!(c.max_pow(), 10);
        assert_eq!(c.bytes_per_op(), 64);
        assert_eq!(c.set_pow(12), 10);
        assert_eq!(c.bytes_per_op(), 1024);
        assert_eq!(c.set_pow(0), 0);
        assert_eq!(c.bytes_per_op(), 1);

        let c = UpdateCursor::new(1056, 200);
        assert_eq!(c.pow(), 11);
        assert_eq!(c.next(), 0..1056);
    }

    #[test]
    fn advance_wraps() {
        let mut c = UpdateCursor::new(1024, 8);
        assert_eq!(c.next(), 0..256);
        assert!(!c.advance(256));
        assert!(!c.advance(256));
        assert!(!c.advance(256));
        assert_eq!(c.next(), 768..1024);
        assert!(c.advance(256));
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn last_chunk_is_short() {
        let mut c = UpdateCursor::new(1056, 9);
        assert_eq!(c.total_chunks(), 3);
        assert_eq!(c.chunk(0), Some(0..512));
        assert_eq!(c.chunk(2), Some(1024..1056));
        assert_eq!(c.chunk(3), None);
        assert_eq!(c.chunk(usize::MAX), None);
        c.advance(1024);
        assert_eq!(c.next(), 1024..1056);
    }

    #[test]
    fn segments_split_at_pages() {
        let segs = segments(100..300, 128).collect::<Vec<_>>();
        assert_eq!(
            segs,
            vec![
                Segment {
                    page: 0,
                    column: 100,
                    bytes: 100..128
                },
                Segment {
                    page: 1,
                    column: 0,
                    bytes: 128..256
                },
                Segment {
                    page: 2,
                    column: 0,
                    bytes: 256..300
                },
            ]
        );
        assert_eq!(segments(5..5, 128).count(), 0);
        assert_eq!(segments(0..1024, 128).count(), 8);
    }
}
