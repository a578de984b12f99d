//! Grayscale compositor
//!
//! The SSD1683 shows four gray levels by running one waveform over both of
//! its RAM planes at once: the LSB of each pixel's 2-bit luma sits in
//! [`RamPlane::Current`], the MSB in [`RamPlane::Previous`]. Mono waveforms
//! read the same two RAMs as "new" and "old" image, so after a grayscale
//! cycle both RAMs and the working buffer must be rewritten with a mono
//! frame before the next mono refresh.
//!
//! # Cycle
//!
//! ```text
//! copy LSB ──► copy MSB ──► display ──► cleanup(prior mono)
//!   (stage)      (stage)    (activate)   (restore + rewrite both RAMs)
//! ```
//!
//! Any step after the first copy leaves the cycle pending until cleanup.

use embedded_graphics::pixelcolor::Gray2;
use embedded_graphics::prelude::*;

use panel::{RamPlane, Waveform, BUFFER_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH, DISPLAY_WIDTH_BYTES};

use crate::error::FrameError;
use crate::framebuffer::{write_bit, FrameBuffer};

/// Most chunks a [`MonoSnapshot`] may be split into.
pub const MAX_SNAPSHOT_CHUNKS: usize = 4;

/// One bit-plane of a 2-bit grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GrayPlane {
    /// Bit 0 of the luma.
    Lsb,
    /// Bit 1 of the luma.
    Msb,
}

impl GrayPlane {
    /// Controller RAM the plane is staged into.
    pub const fn ram_plane(self) -> RamPlane {
        match self {
            GrayPlane::Lsb => RamPlane::Current,
            GrayPlane::Msb => RamPlane::Previous,
        }
    }

    /// Mask selecting this plane's bit from a 2-bit luma.
    pub const fn luma_mask(self) -> u8 {
        match self {
            GrayPlane::Lsb => 0b01,
            GrayPlane::Msb => 0b10,
        }
    }
}

/// One phase of a grayscale display sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GrayscalePass {
    /// The plane must be present in its controller RAM.
    Stage(GrayPlane),
    /// Run a waveform over both RAMs.
    Activate(Waveform),
}

/// The grayscale pass plan: LSB plane, MSB plane, then the grayscale waveform.
///
/// Pure; the HAL walks this plan and aborts at the first failing phase.
pub const fn compose() -> [GrayscalePass; 3] {
    [
        GrayscalePass::Stage(GrayPlane::Lsb),
        GrayscalePass::Stage(GrayPlane::Msb),
        GrayscalePass::Activate(Waveform::Grayscale),
    ]
}

/// Bookkeeping for one grayscale cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GrayscaleCompositor {
    lsb_staged: bool,
    msb_staged: bool,
    buffer_dirty: bool,
    displayed: bool,
}

impl GrayscaleCompositor {
    /// A compositor with no cycle in progress.
    pub const fn new() -> Self {
        Self {
            lsb_staged: false,
            msb_staged: false,
            buffer_dirty: false,
            displayed: false,
        }
    }

    /// The working buffer now holds plane data instead of a mono frame.
    pub fn mark_buffer_dirty(&mut self) {
        self.buffer_dirty = true;
    }

    /// `plane` reached its controller RAM.
    pub fn mark_staged(&mut self, plane: GrayPlane) {
        match plane {
            GrayPlane::Lsb => self.lsb_staged = true,
            GrayPlane::Msb => self.msb_staged = true,
        }
    }

    /// Whether `plane` has been staged since the last cleanup.
    pub fn is_staged(&self, plane: GrayPlane) -> bool {
        match plane {
            GrayPlane::Lsb => self.lsb_staged,
            GrayPlane::Msb => self.msb_staged,
        }
    }

    /// The grayscale waveform ran.
    pub fn mark_displayed(&mut self) {
        self.displayed = true;
    }

    /// Whether the grayscale waveform ran since the last cleanup.
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    /// Whether a cycle has started and not yet been cleaned up.
    pub fn is_pending(&self) -> bool {
        self.lsb_staged || self.msb_staged || self.buffer_dirty || self.displayed
    }

    /// End the cycle.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Mono snapshot
// ---------------------------------------------------------------------------

/// Copy of the mono frame held in caller-owned chunks.
///
/// Lets a caller with no single 15000-byte region (e.g. two
/// [`BW_BUFFER_CHUNK_SIZE`](panel::BW_BUFFER_CHUNK_SIZE) buffers) save the
/// frame before a grayscale cycle and hand it back to cleanup afterwards.
pub struct MonoSnapshot<'s> {
    chunks: heapless::Vec<&'s mut [u8], MAX_SNAPSHOT_CHUNKS>,
}

impl<'s> MonoSnapshot<'s> {
    /// Copy `frame` into `chunks`, filling them in order.
    ///
    /// Storage is validated before anything is copied.
    pub fn capture<I>(frame: &FrameBuffer<'_>, chunks: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = &'s mut [u8]>,
    {
        let mut stored: heapless::Vec<&'s mut [u8], MAX_SNAPSHOT_CHUNKS> = heapless::Vec::new();
        for chunk in chunks {
            stored.push(chunk).map_err(|_| FrameError::TooManyChunks)?;
        }
        let available = stored.iter().map(|c| c.len()).fold(0usize, usize::saturating_add);
        if available < BUFFER_SIZE {
            return Err(FrameError::SnapshotTooSmall {
                needed: BUFFER_SIZE,
                actual: available,
            });
        }

        let mut snapshot = Self { chunks: stored };
        snapshot.fill(frame.as_bytes());
        Ok(snapshot)
    }

    /// Overwrite the saved frame with `src`.
    pub(crate) fn fill(&mut self, mut src: &[u8]) {
        for chunk in &mut self.chunks {
            let n = chunk.len().min(src.len());
            let (head, rest) = src.split_at(n);
            if let Some(dst) = chunk.get_mut(..n) {
                dst.copy_from_slice(head);
            }
            src = rest;
        }
    }

    /// Number of storage chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The saved frame, piece by piece, exactly [`BUFFER_SIZE`] bytes in total.
    pub fn pieces(&self) -> impl Iterator<Item = &[u8]> {
        let mut remaining = BUFFER_SIZE;
        self.chunks.iter().map(move |chunk| {
            let n = chunk.len().min(remaining);
            remaining = remaining.saturating_sub(n);
            chunk.get(..n).unwrap_or_default()
        })
    }

    /// Exchange the saved frame with the contents of `frame`.
    ///
    /// Swapping twice leaves both sides as they were.
    pub fn swap_with(&mut self, frame: &mut FrameBuffer<'_>) {
        let mut dst = frame.as_bytes_mut();
        for chunk in &mut self.chunks {
            let n = chunk.len().min(dst.len());
            let (head, rest) = core::mem::take(&mut dst).split_at_mut(n);
            if let Some(piece) = chunk.get_mut(..n) {
                piece.swap_with_slice(head);
            }
            dst = rest;
        }
    }

    /// Write the saved frame back into `frame`.
    pub fn restore_into(&self, frame: &mut FrameBuffer<'_>) {
        let mut dst = frame.as_bytes_mut();
        for piece in self.pieces() {
            let n = piece.len().min(dst.len());
            let (head, rest) = core::mem::take(&mut dst).split_at_mut(n);
            head.copy_from_slice(piece.get(..head.len()).unwrap_or_default());
            dst = rest;
        }
    }
}

// ---------------------------------------------------------------------------
// GrayPlanes: renderer integration
// ---------------------------------------------------------------------------

/// Draw target splitting [`Gray2`] pixels into an LSB and an MSB plane.
///
/// Luma 3 is white (both bits set), matching the mono polarity, so planes
/// cleared to `0xFF` start out white.
pub struct GrayPlanes<'a> {
    lsb: &'a mut [u8],
    msb: &'a mut [u8],
}

impl<'a> GrayPlanes<'a> {
    /// Wrap two plane buffers of [`BUFFER_SIZE`] bytes each.
    pub fn new(lsb: &'a mut [u8], msb: &'a mut [u8]) -> Result<Self, FrameError> {
        for len in [lsb.len(), msb.len()] {
            if len != BUFFER_SIZE {
                return Err(FrameError::SizeMismatch {
                    expected: BUFFER_SIZE,
                    actual: len,
                });
            }
        }
        Ok(Self { lsb, msb })
    }

    /// The LSB plane.
    pub fn lsb(&self) -> &[u8] {
        &*self.lsb
    }

    /// The MSB plane.
    pub fn msb(&self) -> &[u8] {
        &*self.msb
    }

    fn plane_mut(&mut self, plane: GrayPlane) -> &mut [u8] {
        match plane {
            GrayPlane::Lsb => &mut *self.lsb,
            GrayPlane::Msb => &mut *self.msb,
        }
    }
}

impl DrawTarget for GrayPlanes<'_> {
    type Color = Gray2;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) else {
                continue;
            };
            if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
                continue;
            }
            let luma = color.luma();
            for plane in [GrayPlane::Lsb, GrayPlane::Msb] {
                if let Some(row) = self
                    .plane_mut(plane)
                    .chunks_exact_mut(DISPLAY_WIDTH_BYTES)
                    .nth(usize::from(y))
                {
                    write_bit(row, usize::from(x), luma & plane.luma_mask() != 0);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let luma = color.luma();
        for plane in [GrayPlane::Lsb, GrayPlane::Msb] {
            let fill = if luma & plane.luma_mask() != 0 { 0xFF } else { 0x00 };
            self.plane_mut(plane).fill(fill);
        }
        Ok(())
    }
}

impl OriginDimensions for GrayPlanes<'_> {
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
    use crate::framebuffer::WHITE;
    use panel::BW_BUFFER_CHUNK_SIZE;

    #[test]
    fn test_compose_plan_order() {
        assert_eq!(
            compose(),
            [
                GrayscalePass::Stage(GrayPlane::Lsb),
                GrayscalePass::Stage(GrayPlane::Msb),
                GrayscalePass::Activate(Waveform::Grayscale),
            ]
        );
    }

    #[test]
    fn test_plane_ram_mapping() {
        assert_eq!(GrayPlane::Lsb.ram_plane(), RamPlane::Current);
        assert_eq!(GrayPlane::Msb.ram_plane(), RamPlane::Previous);
    }

    #[test]
    fn test_compositor_cycle() {
        let mut c = GrayscaleCompositor::new();
        assert!(!c.is_pending());

        c.mark_buffer_dirty();
        assert!(c.is_pending());
        assert!(!c.is_staged(GrayPlane::Lsb));

        c.mark_staged(GrayPlane::Lsb);
        c.mark_staged(GrayPlane::Msb);
        c.mark_displayed();
        assert!(c.is_staged(GrayPlane::Msb));
        assert!(c.is_displayed());

        c.reset();
        assert_eq!(c, GrayscaleCompositor::default());
        assert!(!c.is_pending());
    }

    #[test]
    fn test_snapshot_in_two_chunks() {
        let mut raw = vec![WHITE; BUFFER_SIZE];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        let frame = FrameBuffer::new(&mut raw).unwrap();

        let mut a = vec![0u8; BW_BUFFER_CHUNK_SIZE];
        let mut b = vec![0u8; BW_BUFFER_CHUNK_SIZE];
        let snap = MonoSnapshot::capture(&frame, [a.as_mut_slice(), b.as_mut_slice()]).unwrap();
        assert_eq!(snap.chunk_count(), 2);

        let saved: Vec<u8> = snap.pieces().flatten().copied().collect();
        assert_eq!(saved.as_slice(), frame.as_bytes());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut raw = vec![0x3Cu8; BUFFER_SIZE];
        let mut frame = FrameBuffer::new(&mut raw).unwrap();

        let mut store = vec![0u8; BUFFER_SIZE];
        let snap = MonoSnapshot::capture(&frame, [store.as_mut_slice()]).unwrap();

        frame.clear(0x00);
        snap.restore_into(&mut frame);
        assert!(frame.as_bytes().iter().all(|&b| b == 0x3C));
    }

    #[test]
    fn test_snapshot_swap_is_reversible() {
        let mut raw = vec![0x3Cu8; BUFFER_SIZE];
        let mut frame = FrameBuffer::new(&mut raw).unwrap();

        let mut a = vec![0u8; BW_BUFFER_CHUNK_SIZE];
        let mut b = vec![0u8; BW_BUFFER_CHUNK_SIZE + 8];
        let mut snap =
            MonoSnapshot::capture(&frame, [a.as_mut_slice(), b.as_mut_slice()]).unwrap();
        frame.clear(0x00);

        snap.swap_with(&mut frame);
        assert!(frame.as_bytes().iter().all(|&b| b == 0x3C));
        assert!(snap.pieces().flatten().all(|&b| b == 0x00));

        snap.swap_with(&mut frame);
        assert!(frame.as_bytes().iter().all(|&b| b == 0x00));
        assert!(snap.pieces().flatten().all(|&b| b == 0x3C));
    }

    #[test]
    fn test_snapshot_too_small() {
        let mut raw = vec![WHITE; BUFFER_SIZE];
        let frame = FrameBuffer::new(&mut raw).unwrap();
        let mut a = vec![0u8; BW_BUFFER_CHUNK_SIZE];
        let mut b = vec![0u8; 100];
        assert_eq!(
            MonoSnapshot::capture(&frame, [a.as_mut_slice(), b.as_mut_slice()]).err(),
            Some(FrameError::SnapshotTooSmall {
                needed: BUFFER_SIZE,
                actual: BW_BUFFER_CHUNK_SIZE + 100
            })
        );
        assert!(a.iter().all(|&x| x == 0), "nothing copied on error");
    }

    #[test]
    fn test_snapshot_too_many_chunks() {
        let mut raw = vec![WHITE; BUFFER_SIZE];
        let frame = FrameBuffer::new(&mut raw).unwrap();
        let mut store = vec![0u8; 5 * 3000];
        let chunks = store.chunks_mut(3000);
        assert_eq!(
            MonoSnapshot::capture(&frame, chunks).err(),
            Some(FrameError::TooManyChunks)
        );
    }

    #[test]
    fn test_gray_planes_split_luma() {
        let mut lsb = vec![0xFF; BUFFER_SIZE];
        let mut msb = vec![0xFF; BUFFER_SIZE];
        let mut planes = GrayPlanes::new(&mut lsb, &mut msb).unwrap();

        planes
            .draw_iter([
                Pixel(Point::new(0, 0), Gray2::new(0)),
                Pixel(Point::new(1, 0), Gray2::new(1)),
                Pixel(Point::new(2, 0), Gray2::new(2)),
                Pixel(Point::new(3, 0), Gray2::new(3)),
                Pixel(Point::new(-1, 0), Gray2::new(0)),
            ])
            .unwrap();

        // bit 7 = x0 … bit 4 = x3
        assert_eq!(planes.lsb()[0], 0b0101_1111);
        assert_eq!(planes.msb()[0], 0b0011_1111);
    }

    #[test]
    fn test_gray_planes_clear() {
        let mut lsb = vec![0u8; BUFFER_SIZE];
        let mut msb = vec![0u8; BUFFER_SIZE];
        let mut planes = GrayPlanes::new(&mut lsb, &mut msb).unwrap();
        planes.clear(Gray2::new(2)).unwrap();
        assert!(planes.lsb().iter().all(|&b| b == 0x00));
        assert!(planes.msb().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_gray_planes_reject_wrong_size() {
        let mut lsb = vec![0u8; BUFFER_SIZE];
        let mut msb = vec![0u8; 10];
        assert_eq!(
            GrayPlanes::new(&mut lsb, &mut msb).err(),
            Some(FrameError::SizeMismatch {
                expected: BUFFER_SIZE,
                actual: 10
            })
        );
    }
}
