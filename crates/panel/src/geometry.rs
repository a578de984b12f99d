//! Fixed panel geometry
//!
//! These are hardware facts of the SSD1683 400×300 glass, not configuration.
//! The frame buffer the HAL assumes and the allocation the driver hands out
//! must both be exactly [`BUFFER_SIZE`] bytes.

/// Display width in pixels.
pub const DISPLAY_WIDTH: u16 = 400;

/// Display height in pixels.
pub const DISPLAY_HEIGHT: u16 = 300;

/// Bytes per packed row: ⌈400 / 8⌉ = 50.
pub const DISPLAY_WIDTH_BYTES: usize = (DISPLAY_WIDTH as usize + 7) / 8;

/// Total 1bpp frame buffer size: 50 × 300 = 15 000 bytes.
pub const BUFFER_SIZE: usize = DISPLAY_WIDTH_BYTES * DISPLAY_HEIGHT as usize;

/// Chunk size renderers use when saving a copy of the mono buffer.
///
/// Two 8 000-byte chunks cover the 15 000-byte buffer without needing one
/// contiguous allocation.
pub const BW_BUFFER_CHUNK_SIZE: usize = 8000;

/// Static description of the attached panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelInfo {
    /// Marketing / board name.
    pub name: &'static str,
    /// Controller IC.
    pub controller: &'static str,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Gray levels reachable with the two-plane grayscale waveform.
    pub grayscale_levels: u8,
    /// Nominal full refresh duration in milliseconds.
    pub full_refresh_ms: u32,
    /// Nominal half refresh duration in milliseconds.
    pub half_refresh_ms: u32,
    /// Nominal fast refresh duration in milliseconds.
    pub fast_refresh_ms: u32,
}

// Panel dimensions are u16; widened to usize the products cannot overflow.
#[allow(clippy::arithmetic_side_effects)]
impl PanelInfo {
    /// Packed bytes per row for this panel.
    pub const fn width_bytes(&self) -> usize {
        (self.width as usize + 7) / 8
    }

    /// Frame buffer size in bytes for this panel.
    pub const fn buffer_size(&self) -> usize {
        self.width_bytes() * self.height as usize
    }
}

/// The Xteink X4 panel.
pub const PANEL_INFO: PanelInfo = PanelInfo {
    name: "Xteink X4 4.2\"",
    controller: "SSD1683",
    width: DISPLAY_WIDTH,
    height: DISPLAY_HEIGHT,
    grayscale_levels: 4,
    full_refresh_ms: 3000,
    half_refresh_ms: 1700,
    fast_refresh_ms: 500,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_geometry() {
        assert_eq!(DISPLAY_WIDTH_BYTES, 50, "400 px / 8 = 50 bytes per row");
        assert_eq!(BUFFER_SIZE, 15_000, "50 × 300 = 15 000 bytes");
    }

    #[test]
    fn test_panel_info_matches_constants() {
        assert_eq!(PANEL_INFO.width_bytes(), DISPLAY_WIDTH_BYTES);
        assert_eq!(PANEL_INFO.buffer_size(), BUFFER_SIZE);
    }

    #[test]
    fn test_two_chunks_cover_buffer() {
        assert!(2 * BW_BUFFER_CHUNK_SIZE >= BUFFER_SIZE);
        assert!(BW_BUFFER_CHUNK_SIZE < BUFFER_SIZE);
    }
}
