//! One-shot frame buffer allocation
//!
//! On hardware the frame buffer is a `static` placed in DMA-reachable SRAM.
//! [`claim_frame_buffer`] hands it out exactly once, so a driver can return
//! it from [`PanelDriver::allocate_buffer`](crate::PanelDriver::allocate_buffer)
//! without `unsafe`.

use static_cell::StaticCell;

use crate::geometry::BUFFER_SIZE;

static FRAME_BUFFER: StaticCell<[u8; BUFFER_SIZE]> = StaticCell::new();

/// Claim the process-wide frame buffer, initialised to white (0xFF).
///
/// Returns `None` on every call after the first.
pub fn claim_frame_buffer() -> Option<&'static mut [u8; BUFFER_SIZE]> {
    #[allow(clippy::large_stack_arrays)]
    FRAME_BUFFER.try_init([0xFF; BUFFER_SIZE])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Only this test may touch FRAME_BUFFER: the cell is process-wide.
    #[test]
    fn test_claim_frame_buffer_only_once() {
        let first = claim_frame_buffer().unwrap();
        assert_eq!(first.len(), BUFFER_SIZE);
        assert!(first.iter().all(|&b| b == 0xFF));
        assert!(claim_frame_buffer().is_none(), "second claim must fail");
    }
}
