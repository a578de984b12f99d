//! Display HAL for the Xteink X4 e-paper panel
//!
//! Owns the single 1bpp frame buffer the panel driver allocates and
//! coordinates everything that happens to it between the renderer and the
//! glass: drawing and blitting, four-level grayscale cycles, refresh
//! waveform selection, and deep sleep.
//!
//! # Components
//!
//! - [`framebuffer`]: clear, bounds-checked blits, `embedded-graphics` target
//! - [`grayscale`]: two-plane staging, pass plan, mono snapshot/restore
//! - [`refresh`]: `RefreshMode` → waveform, advisory ghosting counters
//! - [`power`]: Active / Sleeping transitions
//! - [`HalDisplay`]: the facade tying them to one [`panel::PanelDriver`]
//!
//! # Features
//!
//! - `std`: Enable `panel` mocks for host-side use
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```
//! use display_hal::{HalDisplay, RefreshMode};
//! use embedded_graphics::{
//!     pixelcolor::BinaryColor,
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use panel::mocks::MockPanel;
//!
//! let mut display = HalDisplay::new(MockPanel::new());
//! display.begin()?;
//!
//! Rectangle::new(Point::new(10, 10), Size::new(100, 50))
//!     .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
//!     .draw(display.frame_buffer_mut()?)
//!     .unwrap();
//!
//! display.display_buffer(RefreshMode::Full)?;
//! # Ok::<(), display_hal::HalError<panel::mocks::MockPanelError>>(())
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
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod framebuffer;
pub mod grayscale;
pub mod hal;
pub mod power;
pub mod refresh;

pub use config::HalConfig;
pub use error::{FrameError, HalError};
pub use framebuffer::{FrameBuffer, ImageSource, Rect, BLACK, WHITE};
pub use grayscale::{
    compose, GrayPlane, GrayPlanes, GrayscaleCompositor, GrayscalePass, MonoSnapshot,
    MAX_SNAPSHOT_CHUNKS,
};
pub use hal::HalDisplay;
pub use power::{PowerController, PowerState};
pub use refresh::{RefreshMode, RefreshOrchestrator, RefreshState, RefreshStats};
