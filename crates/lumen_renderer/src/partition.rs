//! Scanline partitioning across worker threads.
//!
//! Rows are divided into one contiguous chunk per worker; the last chunk
//! absorbs the remainder so the chunks cover the image exactly.

use std::ops::Range;

/// A contiguous band of image rows owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanlineChunk {
    /// First row (inclusive)
    pub start: u32,
    /// One past the last row
    pub end: u32,
}

impl ScanlineChunk {
    /// Create a new chunk.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of rows in the chunk.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Rows as a range.
    pub fn rows(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Split `[0, height)` into `threads` chunks.
///
/// `threads` is clamped to `[1, height]`, so every chunk holds at least one
/// row. Returns no chunks for a zero-height image.
pub fn partition_rows(height: u32, threads: usize) -> Vec<ScanlineChunk> {
    if height == 0 {
        return Vec::new();
    }

    let threads = threads.clamp(1, height as usize) as u32;
    let rows_per_thread = height / threads;

    (0..threads)
        .map(|t| {
            let start = t * rows_per_thread;
            let end = if t == threads - 1 {
                height
            } else {
                start + rows_per_thread
            };
            ScanlineChunk::new(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(chunks: &[ScanlineChunk], height: u32) {
        let mut covered = vec![0u32; height as usize];
        for chunk in chunks {
            assert!(!chunk.is_empty());
            for row in chunk.rows() {
                covered[row as usize] += 1;
            }
        }
        assert!(
            covered.iter().all(|&c| c == 1),
            "rows covered unevenly: {:?}",
            covered
        );
    }

    #[test]
    fn test_partition_covers_every_thread_count() {
        for height in [1, 2, 7, 64, 225] {
            for threads in 1..=height as usize {
                let chunks = partition_rows(height, threads);
                assert_eq!(chunks.len(), threads);
                assert_exact_cover(&chunks, height);
            }
        }
    }

    #[test]
    fn test_last_chunk_absorbs_remainder() {
        let chunks = partition_rows(10, 4);
        let bounds: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(bounds, vec![(0, 2), (2, 4), (4, 6), (6, 10)]);
    }

    #[test]
    fn test_thread_count_is_clamped() {
        let chunks = partition_rows(3, 16);
        assert_eq!(chunks.len(), 3);
        assert_exact_cover(&chunks, 3);

        let chunks = partition_rows(5, 0);
        assert_eq!(chunks, vec![ScanlineChunk::new(0, 5)]);

        assert!(partition_rows(0, 4).is_empty());
    }
}
