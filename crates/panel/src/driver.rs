//! Panel driver abstraction

use crate::waveform::Waveform;

/// Controller image RAM plane.
///
/// The SSD1683 holds two full-frame RAMs. Mono waveforms compare the
/// `Current` image against `Previous`; the grayscale waveform instead reads
/// one intensity bit from each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RamPlane {
    /// New image RAM (Write RAM B/W, 0x24).
    Current,
    /// Old image RAM (Write RAM Red, 0x26).
    Previous,
}

/// Physical panel driver consumed by the display HAL.
///
/// Implementations own the SPI/GPIO transactions and the waveform tables.
/// Every method blocks until the controller has finished (BUSY released);
/// there is no cancellation once a waveform has started.
pub trait PanelDriver {
    /// Error type for bus and timing failures
    type Error: core::fmt::Debug;

    /// Reset and configure the controller. Also used to wake from deep sleep.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Hand out the physical frame buffer.
    ///
    /// Called by the HAL during `begin()`. The region must live for the
    /// rest of the program and is expected to be
    /// [`BUFFER_SIZE`](crate::BUFFER_SIZE) bytes; the HAL verifies this.
    /// Returns `None` once the buffer has already been handed out.
    fn allocate_buffer(&mut self) -> Option<&'static mut [u8]>;

    /// Write `buffer` to [`RamPlane::Current`], run `waveform`, and return
    /// once the panel has latched the image.
    fn transfer(&mut self, buffer: &[u8], waveform: Waveform) -> Result<(), Self::Error>;

    /// Stream `data` into one RAM plane without refreshing the panel.
    fn write_plane(&mut self, plane: RamPlane, data: &[u8]) -> Result<(), Self::Error>;

    /// Run `waveform` over the RAM planes as they currently are.
    fn activate(&mut self, waveform: Waveform) -> Result<(), Self::Error>;

    /// Enter deep sleep (RAM retained, ~1 µA).
    fn enter_deep_sleep(&mut self) -> Result<(), Self::Error>;
}
