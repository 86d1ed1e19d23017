//! Byte storage for the rendered image.

use crate::ScanlineChunk;
use std::ops::Range;

/// Bytes per pixel (RGB8).
pub const CHANNELS: usize = 3;

/// Row-major RGB8 pixel buffer, `width * height * 3` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Create a new black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// The gradient test pattern: red grows left to right, green top to
    /// bottom, blue stays zero.
    pub fn gradient(width: u32, height: u32) -> Self {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let r = ramp(x, width);
                let g = ramp(y, height);
                buffer.set(x, y, [(255.999 * r) as u8, (255.999 * g) as u8, 0]);
            }
        }
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw bytes in row-major RGB order.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.index(x, y);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.index(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Reallocate for new dimensions. Returns false, leaving the buffer
    /// untouched, when the dimensions are unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        *self = Self::new(width, height);
        true
    }

    /// Split the buffer into one exclusive view per chunk.
    ///
    /// # Panics
    ///
    /// Panics if the chunks are not contiguous from row 0 or run past the
    /// last row.
    pub fn split_rows_mut(&mut self, chunks: &[ScanlineChunk]) -> Vec<RowsMut<'_>> {
        let width = self.width;
        let height = self.height;
        let row_bytes = width as usize * CHANNELS;
        let mut rest: &mut [u8] = &mut self.pixels;
        let mut next_row = 0;
        let mut views = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            assert_eq!(chunk.start, next_row, "scanline chunks must be contiguous");
            assert!(chunk.end <= height, "scanline chunk past last row");

            let (head, tail) =
                std::mem::take(&mut rest).split_at_mut(chunk.len() as usize * row_bytes);
            views.push(RowsMut {
                rows: chunk.rows(),
                width,
                pixels: head,
            });
            rest = tail;
            next_row = chunk.end;
        }

        views
    }
}

/// Exclusive, writable view of a contiguous band of rows.
///
/// Coordinates passed to [`RowsMut::set`] are image coordinates, not
/// band-relative ones.
#[derive(Debug)]
pub struct RowsMut<'a> {
    rows: Range<u32>,
    width: u32,
    pixels: &'a mut [u8],
}

impl RowsMut<'_> {
    /// Image rows covered by this view.
    pub fn rows(&self) -> Range<u32> {
        self.rows.clone()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Set pixel (x, y); `y` must lie in [`RowsMut::rows`].
    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        debug_assert!(self.rows.contains(&y), "row {} outside band {:?}", y, self.rows);
        let local_y = (y - self.rows.start) as usize;
        let i = (local_y * self.width as usize + x as usize) * CHANNELS;
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgb);
    }
}

/// i / (n - 1), with single-sample axes pinned to zero.
fn ramp(i: u32, n: u32) -> f64 {
    if n > 1 {
        i as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition_rows;

    #[test]
    fn test_buffer_layout() {
        let buffer = FrameBuffer::new(4, 3);
        assert_eq!(buffer.pixels().len(), 4 * 3 * 3);

        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(buffer.index(x, y), ((y * 4 + x) * 3) as usize);
            }
        }
    }

    #[test]
    fn test_set_get() {
        let mut buffer = FrameBuffer::new(4, 3);
        buffer.set(2, 1, [10, 20, 30]);

        assert_eq!(buffer.get(2, 1), [10, 20, 30]);
        assert_eq!(&buffer.pixels()[18..21], &[10, 20, 30]);
        assert_eq!(buffer.get(1, 2), [0, 0, 0]);
    }

    #[test]
    fn test_resize_only_on_change() {
        let mut buffer = FrameBuffer::new(4, 3);
        buffer.set(0, 0, [1, 2, 3]);

        assert!(!buffer.resize(4, 3));
        assert_eq!(buffer.get(0, 0), [1, 2, 3]);

        assert!(buffer.resize(5, 2));
        assert_eq!(buffer.pixels().len(), 5 * 2 * 3);
        assert_eq!(buffer.get(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_split_rows_writes_land_in_place() {
        let mut buffer = FrameBuffer::new(3, 7);
        let chunks = partition_rows(7, 3);

        for mut view in buffer.split_rows_mut(&chunks) {
            for y in view.rows() {
                for x in 0..view.width() {
                    view.set(x, y, [x as u8, y as u8, 9]);
                }
            }
        }

        for y in 0..7 {
            for x in 0..3 {
                assert_eq!(buffer.get(x, y), [x as u8, y as u8, 9]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn test_split_rows_rejects_gaps() {
        let mut buffer = FrameBuffer::new(2, 4);
        let chunks = [ScanlineChunk::new(1, 4)];
        buffer.split_rows_mut(&chunks);
    }

    #[test]
    fn test_gradient_pattern() {
        let buffer = FrameBuffer::gradient(3, 2);

        assert_eq!(buffer.get(0, 0), [0, 0, 0]);
        assert_eq!(buffer.get(1, 0), [127, 0, 0]);
        assert_eq!(buffer.get(2, 1), [255, 255, 0]);
        assert_eq!(FrameBuffer::gradient(1, 1).get(0, 0), [0, 0, 0]);
    }
}
