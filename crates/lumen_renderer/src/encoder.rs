//! Image encoders that persist a finished frame.

use crate::{RenderError, RenderResult, CHANNELS};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink for a completed RGB8 frame.
pub trait ImageEncoder {
    /// Persist `pixels` (`width * height * channels` bytes, row-major).
    fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> RenderResult<()>;
}

/// Check that a buffer is well-formed RGB8 before writing it anywhere.
fn check_rgb8(width: u32, height: u32, channels: u8, pixels: &[u8]) -> RenderResult<()> {
    if channels as usize != CHANNELS {
        return Err(RenderError::UnsupportedChannels {
            expected: CHANNELS as u8,
            actual: channels,
        });
    }

    let expected = width as usize * height as usize * CHANNELS;
    if pixels.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Writes through the `image` crate; the format follows the file extension
/// (`.png`, `.jpg`, `.bmp`, ...).
#[derive(Debug, Clone)]
pub struct PngEncoder {
    path: PathBuf,
}

impl PngEncoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageEncoder for PngEncoder {
    fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> RenderResult<()> {
        check_rgb8(width, height, channels, pixels)?;
        image::save_buffer(&self.path, pixels, width, height, image::ColorType::Rgb8)?;
        log::info!("Wrote {}x{} image to {}", width, height, self.path.display());
        Ok(())
    }
}

/// Plain-text PPM (P3) writer.
#[derive(Debug, Clone)]
pub struct PpmEncoder {
    path: PathBuf,
}

impl PpmEncoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageEncoder for PpmEncoder {
    fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> RenderResult<()> {
        check_rgb8(width, height, channels, pixels)?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "P3")?;
        writeln!(writer, "{} {}", width, height)?;
        writeln!(writer, "255")?;

        for rgb in pixels.chunks_exact(CHANNELS) {
            writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
        }
        writer.flush()?;

        log::info!("Wrote {}x{} image to {}", width, height, self.path.display());
        Ok(())
    }
}
