//! Grayscale cycle integration tests.
//!
//! Covers plane staging into the controller RAMs, the display pass plan,
//! mandatory cleanup, and chunked mono snapshots.
//!
//! Run with: cargo test -p display-hal --test integration_grayscale

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use display_hal::{
    FrameError, GrayPlane, GrayPlanes, HalDisplay, HalError, ImageSource, Rect, RefreshMode,
};
use embedded_graphics::pixelcolor::Gray2;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use panel::mocks::{MockPanel, MockPanelError, PanelCall, PanelOp};
use panel::{RamPlane, Waveform, BUFFER_SIZE, BW_BUFFER_CHUNK_SIZE};

type Display = HalDisplay<MockPanel>;

fn started() -> Display {
    let mut display = HalDisplay::new(MockPanel::new());
    display.begin().unwrap();
    display.driver_mut().clear_calls();
    display
}

/// A recognisable mono frame: white with a black block.
fn draw_mono(display: &mut Display) -> Vec<u8> {
    display.clear_screen(0xFF).unwrap();
    display
        .draw_image(&[0x00; 32], Rect::new(40, 20, 32, 8), ImageSource::Ram)
        .unwrap();
    display.buffer().unwrap().to_vec()
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

/// All-zero planes, display, cleanup → buffer equals the saved mono frame.
#[test]
fn test_grayscale_round_trip_restores_mono() {
    let mut display = started();
    let saved = draw_mono(&mut display);
    let zeros = vec![0x00; BUFFER_SIZE];

    display.copy_grayscale_buffers(&zeros, &zeros).unwrap();
    display.display_grayscale_buffer().unwrap();
    display.cleanup_grayscale_buffers(&saved).unwrap();

    assert_eq!(display.buffer().unwrap(), saved.as_slice());
    assert!(!display.is_grayscale_pending());

    let panel = display.driver();
    assert_eq!(
        panel.ops(),
        vec![
            PanelOp::WritePlane,
            PanelOp::WritePlane,
            PanelOp::Activate,
            PanelOp::WritePlane,
            PanelOp::WritePlane,
        ]
    );
    assert_eq!(panel.calls()[2], PanelCall::Activate(Waveform::Grayscale));
    assert_eq!(panel.ram(RamPlane::Current), saved.as_slice());
    assert_eq!(panel.ram(RamPlane::Previous), saved.as_slice());
}

#[test]
fn test_planes_land_in_their_ram() {
    let mut display = started();
    let lsb = vec![0x55; BUFFER_SIZE];
    let msb = vec![0xAA; BUFFER_SIZE];

    display.copy_grayscale_lsb_buffers(&lsb).unwrap();
    display.copy_grayscale_msb_buffers(&msb).unwrap();

    let panel = display.driver();
    assert_eq!(panel.ram(RamPlane::Current), lsb.as_slice());
    assert_eq!(panel.ram(RamPlane::Previous), msb.as_slice());
    assert!(panel.transfers().is_empty(), "staging never refreshes");
}

#[test]
fn test_staged_planes_from_drawn_buffer() {
    let mut display = started();

    display.clear_screen(0x0F).unwrap();
    display.stage_grayscale_plane(GrayPlane::Lsb).unwrap();
    display.clear_screen(0xF0).unwrap();
    display.stage_grayscale_plane(GrayPlane::Msb).unwrap();
    display.display_grayscale_buffer().unwrap();

    let panel = display.driver();
    assert!(panel.ram(RamPlane::Current).iter().all(|&b| b == 0x0F));
    assert!(panel.ram(RamPlane::Previous).iter().all(|&b| b == 0xF0));
}

#[test]
fn test_gray_planes_target_feeds_hal() {
    let mut lsb = vec![0xFF; BUFFER_SIZE];
    let mut msb = vec![0xFF; BUFFER_SIZE];
    let mut planes = GrayPlanes::new(&mut lsb, &mut msb).unwrap();
    Rectangle::new(Point::zero(), Size::new(8, 1))
        .into_styled(PrimitiveStyle::with_fill(Gray2::new(1)))
        .draw(&mut planes)
        .unwrap();

    let mut display = started();
    display.copy_grayscale_buffers(&lsb, &msb).unwrap();

    assert_eq!(display.driver().ram(RamPlane::Current)[0], 0xFF);
    assert_eq!(display.driver().ram(RamPlane::Previous)[0], 0x00);
}

// ---------------------------------------------------------------------------
// Preconditions and failures
// ---------------------------------------------------------------------------

#[test]
fn test_display_requires_both_planes() {
    let mut display = started();
    assert_eq!(
        display.display_grayscale_buffer(),
        Err(HalError::GrayscaleIncomplete {
            lsb: false,
            msb: false
        })
    );

    display
        .copy_grayscale_lsb_buffers(&vec![0xFF; BUFFER_SIZE])
        .unwrap();
    assert_eq!(
        display.display_grayscale_buffer(),
        Err(HalError::GrayscaleIncomplete {
            lsb: true,
            msb: false
        })
    );
    assert!(
        !display.driver().ops().contains(&PanelOp::Activate),
        "waveform must not run"
    );
}

#[test]
fn test_plane_size_validated() {
    let mut display = started();
    display.clear_screen(0x42).unwrap();

    assert_eq!(
        display.copy_grayscale_msb_buffers(&[0u8; 10]),
        Err(HalError::Frame(FrameError::SizeMismatch {
            expected: BUFFER_SIZE,
            actual: 10
        }))
    );
    assert!(display.buffer().unwrap().iter().all(|&b| b == 0x42));
    assert!(!display.is_grayscale_pending());
    assert!(display.driver().calls().is_empty());
}

#[test]
fn test_mono_refresh_blocked_until_cleanup() {
    let mut display = started();
    let saved = draw_mono(&mut display);
    let planes = vec![0xFF; BUFFER_SIZE];

    display.copy_grayscale_buffers(&planes, &planes).unwrap();
    display.display_grayscale_buffer().unwrap();
    assert_eq!(
        display.display_buffer(RefreshMode::Fast),
        Err(HalError::GrayscaleCleanupPending)
    );

    display.cleanup_grayscale_buffers(&saved).unwrap();
    display.display_buffer(RefreshMode::Fast).unwrap();
}

#[test]
fn test_failed_activate_aborts_and_keeps_cycle_pending() {
    let mut display = started();
    let planes = vec![0xFF; BUFFER_SIZE];
    display.copy_grayscale_buffers(&planes, &planes).unwrap();
    display.driver_mut().fail_next(PanelOp::Activate);

    assert_eq!(
        display.display_grayscale_buffer(),
        Err(HalError::Panel(MockPanelError::Injected(PanelOp::Activate)))
    );
    assert!(display.is_grayscale_pending());

    // Planes are still staged, so a retry goes straight to the waveform.
    display.driver_mut().clear_calls();
    display.display_grayscale_buffer().unwrap();
    assert_eq!(display.driver().ops(), vec![PanelOp::Activate]);
}

#[test]
fn test_failed_staging_leaves_buffer_and_cycle_untouched() {
    let mut display = started();
    display.clear_screen(0xA5).unwrap();
    display.driver_mut().fail_next(PanelOp::WritePlane);

    assert_eq!(
        display.copy_grayscale_lsb_buffers(&vec![0x00; BUFFER_SIZE]),
        Err(HalError::Panel(MockPanelError::Injected(PanelOp::WritePlane)))
    );
    assert!(display.buffer().unwrap().iter().all(|&b| b == 0xA5));
    assert!(!display.is_grayscale_pending());
    assert!(display.driver().calls().is_empty());

    // No cycle started, so mono refresh still works.
    display.display_buffer(RefreshMode::Fast).unwrap();
}

#[test]
fn test_failed_stage_from_buffer_starts_no_cycle() {
    let mut display = started();
    display.driver_mut().fail_next(PanelOp::WritePlane);

    assert!(display
        .stage_grayscale_plane(GrayPlane::Msb)
        .unwrap_err()
        .is_panel());
    assert!(!display.is_grayscale_pending());
}

#[test]
fn test_failed_cleanup_keeps_buffer_and_cycle() {
    let mut display = started();
    let saved = draw_mono(&mut display);
    let gray = vec![0x00; BUFFER_SIZE];
    display.copy_grayscale_buffers(&gray, &gray).unwrap();
    display.display_grayscale_buffer().unwrap();
    display.driver_mut().fail_next(PanelOp::WritePlane);

    assert_eq!(
        display.cleanup_grayscale_buffers(&saved),
        Err(HalError::Panel(MockPanelError::Injected(PanelOp::WritePlane)))
    );
    assert_eq!(display.buffer().unwrap(), gray.as_slice());
    assert!(display.is_grayscale_pending());
    assert_eq!(
        display.display_buffer(RefreshMode::Fast),
        Err(HalError::GrayscaleCleanupPending)
    );

    display.cleanup_grayscale_buffers(&saved).unwrap();
    assert_eq!(display.buffer().unwrap(), saved.as_slice());
}

#[test]
fn test_cleanup_size_validated_before_panel() {
    let mut display = started();
    let gray = vec![0x00; BUFFER_SIZE];
    display.copy_grayscale_buffers(&gray, &gray).unwrap();
    display.driver_mut().clear_calls();

    assert_eq!(
        display.cleanup_grayscale_buffers(&[0xFF; 8]),
        Err(HalError::Frame(FrameError::SizeMismatch {
            expected: BUFFER_SIZE,
            actual: 8
        }))
    );
    assert!(display.driver().calls().is_empty());
    assert!(display.is_grayscale_pending());
}

// ---------------------------------------------------------------------------
// Chunked snapshots
// ---------------------------------------------------------------------------

#[test]
fn test_chunked_snapshot_round_trip() {
    let mut display = started();
    let saved = draw_mono(&mut display);

    let mut first = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut second = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut snapshot = display
        .capture_mono_snapshot([first.as_mut_slice(), second.as_mut_slice()])
        .unwrap();

    let gray = vec![0x00; BUFFER_SIZE];
    display.copy_grayscale_buffers(&gray, &gray).unwrap();
    display.display_grayscale_buffer().unwrap();
    display.restore_mono_snapshot(&mut snapshot).unwrap();

    assert_eq!(display.buffer().unwrap(), saved.as_slice());
    assert!(!display.is_grayscale_pending());
    assert_eq!(display.driver().ram(RamPlane::Current), saved.as_slice());
    assert_eq!(display.driver().ram(RamPlane::Previous), saved.as_slice());
    assert!(
        snapshot.pieces().flatten().eq(saved.iter()),
        "snapshot still holds the mono frame"
    );
}

#[test]
fn test_failed_snapshot_restore_keeps_buffer_and_snapshot() {
    let mut display = started();
    let saved = draw_mono(&mut display);

    let mut first = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut second = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut snapshot = display
        .capture_mono_snapshot([first.as_mut_slice(), second.as_mut_slice()])
        .unwrap();

    let gray = vec![0x00; BUFFER_SIZE];
    display.copy_grayscale_buffers(&gray, &gray).unwrap();
    display.display_grayscale_buffer().unwrap();
    display.driver_mut().fail_next(PanelOp::WritePlane);

    assert_eq!(
        display.restore_mono_snapshot(&mut snapshot),
        Err(HalError::Panel(MockPanelError::Injected(PanelOp::WritePlane)))
    );
    assert_eq!(display.buffer().unwrap(), gray.as_slice());
    assert!(display.is_grayscale_pending());
    assert!(snapshot.pieces().flatten().eq(saved.iter()));

    display.restore_mono_snapshot(&mut snapshot).unwrap();
    assert_eq!(display.buffer().unwrap(), saved.as_slice());
    assert!(!display.is_grayscale_pending());
}

#[test]
fn test_snapshot_storage_validated() {
    let display = started();
    let mut small = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    assert_eq!(
        display
            .capture_mono_snapshot([small.as_mut_slice()])
            .err(),
        Some(HalError::Frame(FrameError::SnapshotTooSmall {
            needed: BUFFER_SIZE,
            actual: BW_BUFFER_CHUNK_SIZE
        }))
    );
}
