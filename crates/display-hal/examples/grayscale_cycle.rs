//! Grayscale cycle walkthrough
//!
//! Draws a mono page, shows a four-level gray image over it, then restores
//! the page from a two-chunk snapshot and sleeps. Runs against the recording
//! mock panel and prints the driver calls it produced.
//!
//! Run with: RUST_LOG=debug cargo run -p display-hal --example grayscale_cycle --features std

use embedded_graphics::mono_font::{ascii::FONT_10X20, MonoTextStyle};
use embedded_graphics::pixelcolor::{BinaryColor, Gray2};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use tracing_subscriber::EnvFilter;

use display_hal::{GrayPlanes, HalDisplay, RefreshMode};
use panel::mocks::MockPanel;
use panel::{BUFFER_SIZE, BW_BUFFER_CHUNK_SIZE, PANEL_INFO};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!(
        "{} ({}) {}×{}\n",
        PANEL_INFO.name, PANEL_INFO.controller, PANEL_INFO.width, PANEL_INFO.height
    );

    let mut display = HalDisplay::new(MockPanel::new());
    display.begin()?;

    // Mono page
    display.clear_screen_white()?;
    let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    Text::new("Chapter 1", Point::new(20, 40), style).draw(display.frame_buffer_mut()?)?;
    display.display_buffer(RefreshMode::Full)?;

    // Save it in two renderer-sized chunks
    let mut first = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut second = vec![0u8; BW_BUFFER_CHUNK_SIZE];
    let mut snapshot = display.capture_mono_snapshot([first.as_mut_slice(), second.as_mut_slice()])?;

    // Four gray bars
    let mut lsb = vec![0xFF; BUFFER_SIZE];
    let mut msb = vec![0xFF; BUFFER_SIZE];
    let mut planes = GrayPlanes::new(&mut lsb, &mut msb)?;
    for level in 0..4u8 {
        Rectangle::new(Point::new(20 + i32::from(level) * 90, 100), Size::new(80, 150))
            .into_styled(PrimitiveStyle::with_fill(Gray2::new(level)))
            .draw(&mut planes)?;
    }

    display.copy_grayscale_buffers(&lsb, &msb)?;
    display.display_grayscale_buffer()?;

    // Back to the mono page, then power down
    display.restore_mono_snapshot(&mut snapshot)?;
    display.refresh_display(RefreshMode::Fast, true)?;

    println!("power state: {:?}", display.power_state());
    println!("refresh stats: {:?}", display.refresh_stats());
    println!("driver calls:");
    for op in display.driver().ops() {
        println!("  {op:?}");
    }
    Ok(())
}
