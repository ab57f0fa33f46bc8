//! One-bit framebuffer for the monochrome OLED.
//!
//! Pages draw into this RAM buffer; the finished frame is then handed to a
//! [`DisplaySink`](crate::display_manager::DisplaySink) in one push.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

/// Packed 1-bit frame, row-major, eight pixels per byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoFrame {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl MonoFrame {
    /// Allocate a blank (all off) frame.
    pub fn new(size: Size) -> Self {
        let len = (size.width as usize * size.height as usize).div_ceil(8);
        Self {
            width: size.width,
            height: size.height,
            bits: vec![0; len],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> (usize, u8) {
        let i = y as usize * self.width as usize + x as usize;
        (i / 8, 1 << (i % 8))
    }

    /// Whether the pixel at `(x, y)` is lit. Out-of-bounds pixels are off.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (byte, mask) = self.index(x, y);
        self.bits[byte] & mask != 0
    }

    /// Number of lit pixels.
    pub fn lit_pixels(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Whether any pixel inside `area` is lit.
    pub fn any_lit_in(&self, top_left: Point, size: Size) -> bool {
        let x0 = top_left.x.max(0) as u32;
        let y0 = top_left.y.max(0) as u32;
        (y0..(y0 + size.height).min(self.height))
            .any(|y| (x0..(x0 + size.width).min(self.width)).any(|x| self.pixel(x, y)))
    }

    /// Every pixel, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<BinaryColor>> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| {
                Pixel(
                    Point::new(x as i32, y as i32),
                    BinaryColor::from(self.pixel(x, y)),
                )
            })
        })
    }

    /// Turn every pixel off.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }
}

impl OriginDimensions for MonoFrame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for MonoFrame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
                continue;
            }
            let (byte, mask) = self.index(x as u32, y as u32);
            if color.is_on() {
                self.bits[byte] |= mask;
            } else {
                self.bits[byte] &= !mask;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.bits.fill(if color.is_on() { 0xFF } else { 0 });
        // Padding bits past the last pixel stay off.
        let tail = (self.width as usize * self.height as usize) % 8;
        if let (true, Some(last)) = (tail != 0, self.bits.last_mut()) {
            *last &= (1u8 << tail) - 1;
        }
        Ok(())
    }
}
