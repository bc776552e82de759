//! Read-only page store and scanline addressing.
//!
//! The store is a flat run of little-endian RGB565 pixels laid out as
//! `P` pages of `H` lines of `W` pixels.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};

/// Bytes per stored pixel
pub const PIXEL_BYTES: usize = 2;

/// Size of the backing store for a `w` x `h` image with `pages` pages
pub const fn store_bytes(w: usize, h: usize, pages: usize) -> usize {
    w * h * pages * PIXEL_BYTES
}

/// Pack 8-bit channels into an RGB565 word by dropping the low bits
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    RawU16::from(Rgb565::new(r >> 3, g >> 2, b >> 3)).into_inner()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Backing data doesn't match the configured geometry
    SizeMismatch { expected: usize, actual: usize },
}

/// One line of pixels handed to the display engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanline<'a> {
    offset: usize,
    pixels: &'a [u8],
}

impl<'a> Scanline<'a> {
    /// Byte offset of the line from the start of the store
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Raw RGB565 pixel bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.pixels
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Scanline<'_> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Scanline {{ offset: {} }}", self.offset)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageStore<'a, const W: usize, const H: usize, const P: usize> {
    data: &'a [u8],
}

impl<'a, const W: usize, const H: usize, const P: usize> ImageStore<'a, W, H, P> {
    pub const LINE_BYTES: usize = W * PIXEL_BYTES;
    pub const BYTES: usize = store_bytes(W, H, P);

    pub fn new(data: &'a [u8]) -> Result<Self, ImageError> {
        if data.len() != Self::BYTES {
            return Err(ImageError::SizeMismatch {
                expected: Self::BYTES,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// Byte offset of `(page, line)`; both indices must be in range
    pub const fn line_offset(page: usize, line: usize) -> usize {
        (page * H + line) * W * PIXEL_BYTES
    }

    /// Address the given line of the given page.
    ///
    /// Indices wrap into range so a bad cursor can only select the wrong line,
    /// never read outside the store.
    pub fn scanline(&self, page: usize, line: usize) -> Scanline<'a> {
        let offset = Self::line_offset(page % P, line % H);
        Scanline {
            offset,
            pixels: &self.data[offset..offset + Self::LINE_BYTES],
        }
    }
}
