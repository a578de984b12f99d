//! Frame buffer manager
//!
//! A view over the driver's physical 1bpp buffer: 50 bytes per row, 300
//! rows, MSB-first, bit 1 = white, bit 0 = black.
//!
//! Every mutating operation validates its arguments before the first byte
//! is written, so a rejected call leaves the buffer untouched. Blits are
//! never clipped: clipping a packed bitmap silently shifts data into the
//! neighbouring row.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use panel::{BUFFER_SIZE, BW_BUFFER_CHUNK_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH, DISPLAY_WIDTH_BYTES};

use crate::error::FrameError;

/// Fill byte for an all-white panel.
pub const WHITE: u8 = 0xFF;

/// Fill byte for an all-black panel.
pub const BLACK: u8 = 0x00;

/// Pixel rectangle on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    /// Left edge in pixels.
    pub x: u16,
    /// Top edge in pixels.
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole panel.
    pub const fn full_panel() -> Self {
        Self::new(0, 0, DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }

    /// Non-empty and fully inside `[0, 400) × [0, 300)`.
    pub fn is_within_panel(&self) -> bool {
        let right = u32::from(self.x).saturating_add(u32::from(self.width));
        let bottom = u32::from(self.y).saturating_add(u32::from(self.height));
        self.width > 0
            && self.height > 0
            && right <= u32::from(DISPLAY_WIDTH)
            && bottom <= u32::from(DISPLAY_HEIGHT)
    }

    /// Packed source bytes per row: ⌈width / 8⌉.
    pub fn row_stride(&self) -> usize {
        usize::from(self.width).div_ceil(8)
    }

    /// Source bytes needed to cover the rectangle.
    pub fn required_len(&self) -> usize {
        self.row_stride().saturating_mul(usize::from(self.height))
    }

    fn is_byte_aligned(&self) -> bool {
        self.x % 8 == 0 && self.width % 8 == 0
    }
}

/// Where blit source data lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageSource {
    /// Ordinary RAM; rows are copied directly.
    #[default]
    Ram,
    /// Memory-mapped flash / static storage; each row is read through a
    /// small staging buffer so the slow bus is touched once per byte.
    Flash,
}

/// The HAL's view of the physical frame buffer.
pub struct FrameBuffer<'a> {
    bytes: &'a mut [u8],
}

impl<'a> FrameBuffer<'a> {
    /// Wrap a physical buffer, which must be exactly [`BUFFER_SIZE`] bytes.
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, FrameError> {
        check_frame_len(bytes.len())?;
        Ok(Self { bytes })
    }

    /// Set every byte to `color`.
    pub fn clear(&mut self, color: u8) {
        self.bytes.fill(color);
    }

    /// Copy a packed 1bpp image into `rect`.
    ///
    /// `data` rows are ⌈rect.width / 8⌉ bytes wide, MSB-first. Bits of the
    /// destination outside `rect` are preserved even when `rect` does not
    /// start or end on a byte boundary.
    pub fn draw_image(
        &mut self,
        data: &[u8],
        rect: Rect,
        source: ImageSource,
    ) -> Result<(), FrameError> {
        if !rect.is_within_panel() {
            return Err(FrameError::OutOfBounds);
        }
        if data.len() < rect.required_len() {
            return Err(FrameError::ImageTooShort {
                needed: rect.required_len(),
                actual: data.len(),
            });
        }

        let stride = rect.row_stride();
        let rows = self
            .bytes
            .chunks_exact_mut(DISPLAY_WIDTH_BYTES)
            .skip(usize::from(rect.y))
            .take(usize::from(rect.height))
            .zip(data.chunks(stride));

        match source {
            ImageSource::Ram => {
                for (dst, src) in rows {
                    blit_row(dst, src, rect);
                }
            }
            ImageSource::Flash => {
                let mut staging = [0u8; DISPLAY_WIDTH_BYTES];
                for (dst, src) in rows {
                    for (s, byte) in staging.iter_mut().zip(src.iter().copied()) {
                        *s = byte;
                    }
                    if let Some(row) = staging.get(..stride) {
                        blit_row(dst, row, rect);
                    }
                }
            }
        }
        Ok(())
    }

    /// Overwrite the whole buffer from `src`, which must be [`BUFFER_SIZE`] bytes.
    pub fn copy_from(&mut self, src: &[u8]) -> Result<(), FrameError> {
        check_frame_len(src.len())?;
        self.bytes.copy_from_slice(src);
        Ok(())
    }

    /// Raw buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &*self.bytes
    }

    /// Mutable raw buffer contents.
    ///
    /// The length is fixed; only the pixel data can change.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    /// The buffer in [`BW_BUFFER_CHUNK_SIZE`] pieces (the last one shorter).
    pub fn chunks(&self) -> core::slice::Chunks<'_, u8> {
        self.bytes.chunks(BW_BUFFER_CHUNK_SIZE)
    }

    /// Pixel at `(x, y)`: `Some(true)` for white, `None` outside the panel.
    pub fn pixel(&self, x: u16, y: u16) -> Option<bool> {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return None;
        }
        let row = self.bytes.chunks_exact(DISPLAY_WIDTH_BYTES).nth(usize::from(y))?;
        read_bit(row, usize::from(x))
    }

    /// Set the pixel at `(x, y)`; ignored outside the panel.
    pub fn set_pixel(&mut self, x: u16, y: u16, white: bool) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        if let Some(row) = self
            .bytes
            .chunks_exact_mut(DISPLAY_WIDTH_BYTES)
            .nth(usize::from(y))
        {
            write_bit(row, usize::from(x), white);
        }
    }
}

/// Reject whole-frame data that is not [`BUFFER_SIZE`] bytes.
pub(crate) fn check_frame_len(len: usize) -> Result<(), FrameError> {
    if len != BUFFER_SIZE {
        return Err(FrameError::SizeMismatch {
            expected: BUFFER_SIZE,
            actual: len,
        });
    }
    Ok(())
}

/// Copy one source row into one destination row at `rect.x`.
// rect was validated by the caller: rect.x + rect.width <= 400, so every
// column index below is < 400 and every byte index < DISPLAY_WIDTH_BYTES.
#[allow(clippy::arithmetic_side_effects)]
fn blit_row(dst: &mut [u8], src: &[u8], rect: Rect) {
    let x = usize::from(rect.x);
    if rect.is_byte_aligned() {
        let start = x / 8;
        let len = rect.row_stride().min(src.len());
        if let (Some(d), Some(s)) = (dst.get_mut(start..start + len), src.get(..len)) {
            d.copy_from_slice(s);
        }
        return;
    }
    for col in 0..usize::from(rect.width) {
        if let Some(white) = read_bit(src, col) {
            write_bit(dst, x + col, white);
        }
    }
}

/// Read pixel `px` of a packed MSB-first row.
#[allow(clippy::arithmetic_side_effects)] // px % 8 <= 7
pub(crate) fn read_bit(row: &[u8], px: usize) -> Option<bool> {
    row.get(px / 8).map(|b| b & (0x80 >> (px % 8)) != 0)
}

/// Write pixel `px` of a packed MSB-first row; ignored past the row end.
#[allow(clippy::arithmetic_side_effects)] // px % 8 <= 7
pub(crate) fn write_bit(row: &mut [u8], px: usize, set: bool) {
    if let Some(b) = row.get_mut(px / 8) {
        let mask = 0x80 >> (px % 8);
        if set {
            *b |= mask;
        } else {
            *b &= !mask;
        }
    }
}

// ---------------------------------------------------------------------------
// DrawTarget: renderer integration
// ---------------------------------------------------------------------------

impl DrawTarget for FrameBuffer<'_> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    /// `BinaryColor::On` (black) clears the bit, `Off` (white) sets it.
    /// Pixels outside the panel are skipped.
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) else {
                continue;
            };
            self.set_pixel(x, y, color == BinaryColor::Off);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        FrameBuffer::clear(
            self,
            match color {
                BinaryColor::On => BLACK,
                BinaryColor::Off => WHITE,
            },
        );
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(u32::from(DISPLAY_WIDTH), u32::from(DISPLAY_HEIGHT))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    fn buffer() -> Vec<u8> {
        vec![WHITE; BUFFER_SIZE]
    }

    #[test]
    fn test_new_rejects_wrong_size() {
        let mut short = [0u8; 100];
        assert_eq!(
            FrameBuffer::new(&mut short).err(),
            Some(FrameError::SizeMismatch {
                expected: BUFFER_SIZE,
                actual: 100
            })
        );
    }

    #[test]
    fn test_clear() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        fb.clear(0x5A);
        assert!(fb.as_bytes().iter().all(|&b| b == 0x5A));
        assert_eq!(fb.as_bytes().len(), 15_000);
    }

    #[test]
    fn test_rect_bounds() {
        assert!(Rect::full_panel().is_within_panel());
        assert!(Rect::new(392, 292, 8, 8).is_within_panel());
        assert!(!Rect::new(393, 0, 8, 1).is_within_panel());
        assert!(!Rect::new(0, 293, 1, 8).is_within_panel());
        assert!(!Rect::new(0, 0, 0, 1).is_within_panel());
        assert!(!Rect::new(u16::MAX, u16::MAX, u16::MAX, u16::MAX).is_within_panel());
    }

    #[test]
    fn test_rect_stride() {
        assert_eq!(Rect::new(0, 0, 8, 1).row_stride(), 1);
        assert_eq!(Rect::new(0, 0, 9, 1).row_stride(), 2);
        assert_eq!(Rect::new(0, 0, 12, 3).required_len(), 6);
    }

    #[test]
    fn test_aligned_blit() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        let image = [0x00, 0x0F, 0xF0, 0xAA];
        fb.draw_image(&image, Rect::new(16, 1, 16, 2), ImageSource::Ram)
            .unwrap();

        let bytes = fb.as_bytes();
        assert_eq!(&bytes[50 + 2..50 + 4], &[0x00, 0x0F]);
        assert_eq!(&bytes[100 + 2..100 + 4], &[0xF0, 0xAA]);
        assert_eq!(bytes[50 + 1], WHITE);
        assert_eq!(bytes[50 + 4], WHITE);
        assert_eq!(bytes.iter().filter(|&&b| b != WHITE).count(), 4);
    }

    #[test]
    fn test_unaligned_blit_preserves_neighbour_bits() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        // 4 black pixels starting at x = 2
        fb.draw_image(&[0x00], Rect::new(2, 0, 4, 1), ImageSource::Ram)
            .unwrap();
        assert_eq!(fb.as_bytes()[0], 0b1100_0011);
        assert_eq!(fb.pixel(1, 0), Some(true));
        assert_eq!(fb.pixel(2, 0), Some(false));
        assert_eq!(fb.pixel(5, 0), Some(false));
        assert_eq!(fb.pixel(6, 0), Some(true));
    }

    #[test]
    fn test_unaligned_blit_across_byte_boundary() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        fb.draw_image(&[0x00, 0x00], Rect::new(6, 0, 10, 1), ImageSource::Ram)
            .unwrap();
        assert_eq!(fb.as_bytes()[0], 0b1111_1100);
        assert_eq!(fb.as_bytes()[1], 0b0000_0000);
        assert_eq!(fb.as_bytes()[2], WHITE);
    }

    #[test]
    fn test_flash_source_matches_ram_source() {
        let image: Vec<u8> = (0..=255u8).cycle().take(13 * 20).collect();
        let rect = Rect::new(3, 7, 100, 20);

        let mut a = buffer();
        let mut b = buffer();
        FrameBuffer::new(&mut a)
            .unwrap()
            .draw_image(&image, rect, ImageSource::Ram)
            .unwrap();
        FrameBuffer::new(&mut b)
            .unwrap()
            .draw_image(&image, rect, ImageSource::Flash)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_bounds_rejected_without_write() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        let image = [0u8; 64];
        assert_eq!(
            fb.draw_image(&image, Rect::new(396, 0, 8, 8), ImageSource::Ram),
            Err(FrameError::OutOfBounds)
        );
        assert!(fb.as_bytes().iter().all(|&b| b == WHITE));
    }

    #[test]
    fn test_short_image_rejected_without_write() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        assert_eq!(
            fb.draw_image(&[0u8; 7], Rect::new(0, 0, 8, 8), ImageSource::Ram),
            Err(FrameError::ImageTooShort {
                needed: 8,
                actual: 7
            })
        );
        assert!(fb.as_bytes().iter().all(|&b| b == WHITE));
    }

    #[test]
    fn test_chunks_cover_buffer() {
        let mut raw = buffer();
        let fb = FrameBuffer::new(&mut raw).unwrap();
        let lens: Vec<usize> = fb.chunks().map(<[u8]>::len).collect();
        assert_eq!(lens, vec![8000, 7000]);
    }

    #[test]
    fn test_draw_target_pixels() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();

        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[0], 0x7F, "pixel (0,0) black → bit 7 clear");

        Pixel(Point::new(8, 1), BinaryColor::On).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[51], 0x7F);

        Pixel(Point::new(0, 0), BinaryColor::Off).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[0], WHITE);
    }

    #[test]
    fn test_draw_target_ignores_out_of_bounds() {
        let mut raw = buffer();
        let mut fb = FrameBuffer::new(&mut raw).unwrap();
        fb.draw_iter([
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(0, -1), BinaryColor::On),
            Pixel(Point::new(400, 0), BinaryColor::On),
            Pixel(Point::new(0, 300), BinaryColor::On),
        ])
        .unwrap();
        assert!(fb.as_bytes().iter().all(|&b| b == WHITE));
    }

    #[test]
    fn test_draw_target_rectangle_matches_blit() {
        let mut a = buffer();
        let mut b = buffer();

        let mut fa = FrameBuffer::new(&mut a).unwrap();
        Rectangle::new(Point::new(8, 4), Size::new(16, 3))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fa)
            .unwrap();

        let mut fb = FrameBuffer::new(&mut b).unwrap();
        fb.draw_image(&[0u8; 6], Rect::new(8, 4, 16, 3), ImageSource::Ram)
            .unwrap();

        assert_eq!(a, b);
    }
}
