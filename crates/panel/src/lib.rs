//! Panel driver interface for the Xteink X4 e-paper display
//!
//! This crate describes the SSD1683 400×300 panel as seen by the display
//! HAL: its fixed geometry, the waveforms the controller can execute, and
//! the [`PanelDriver`] trait a physical driver implements.
//!
//! # Architecture Layers
//!
//! ```text
//! Application / renderer
//!         ↓
//! display-hal (frame buffer, grayscale, refresh, power)
//!         ↓
//! panel (this crate - driver trait + geometry)
//!         ↓
//! SSD1683 SPI driver (board support, external)
//! ```
//!
//! # Features
//!
//! - `std`: Enable the recording [`mocks::MockPanel`] (for testing)
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```no_run
//! use panel::{PanelDriver, Waveform};
//!
//! fn push<D: PanelDriver>(driver: &mut D, frame: &[u8]) -> Result<(), D::Error> {
//!     driver.transfer(frame, Waveform::Full)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod alloc;
pub mod driver;
pub mod geometry;
pub mod waveform;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use driver::{PanelDriver, RamPlane};
pub use geometry::{
    PanelInfo, BUFFER_SIZE, BW_BUFFER_CHUNK_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    DISPLAY_WIDTH_BYTES, PANEL_INFO,
};
pub use waveform::{QualityTier, Waveform};
