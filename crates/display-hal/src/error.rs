//! HAL error types

use thiserror::Error;

/// Errors from buffer-only operations that never touch the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Rectangle is empty or extends past the panel edge.
    #[error("rectangle out of bounds")]
    OutOfBounds,
    /// Image data is shorter than the rectangle requires.
    #[error("image data too short: need {needed} bytes, got {actual}")]
    ImageTooShort {
        /// Bytes required by the rectangle.
        needed: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// Buffer or plane length differs from the panel buffer size.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Panel buffer size.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// Snapshot storage cannot hold the whole frame.
    #[error("snapshot storage too small: need {needed} bytes, got {actual}")]
    SnapshotTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available across all chunks.
        actual: usize,
    },
    /// Snapshot storage is split into more chunks than supported.
    #[error("snapshot storage split into too many chunks")]
    TooManyChunks,
}

/// Display HAL errors, generic over the panel driver error `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HalError<E: core::fmt::Debug> {
    /// Operation invoked before `begin()`.
    #[error("display not initialised")]
    NotInitialized,
    /// `begin()` invoked twice.
    #[error("display already initialised")]
    AlreadyInitialized,
    /// Driver has no frame buffer left to hand out.
    #[error("driver frame buffer already handed out")]
    BufferUnavailable,
    /// Driver allocation does not match the panel buffer size.
    #[error("frame buffer size mismatch: expected {expected} bytes, driver allocated {actual}")]
    BufferSizeMismatch {
        /// Panel buffer size.
        expected: usize,
        /// Driver allocation length.
        actual: usize,
    },
    /// Rejected buffer operation; the frame buffer is unchanged.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Panel operation while the panel is in deep sleep.
    #[error("panel is in deep sleep")]
    PanelAsleep,
    /// Grayscale display requested before both planes were staged.
    #[error("grayscale planes not staged (lsb: {lsb}, msb: {msb})")]
    GrayscaleIncomplete {
        /// LSB plane staged.
        lsb: bool,
        /// MSB plane staged.
        msb: bool,
    },
    /// Mono refresh requested while a grayscale cycle awaits cleanup.
    #[error("grayscale cycle pending cleanup")]
    GrayscaleCleanupPending,
    /// Panel driver failure (bus timeout etc.), not retried.
    #[error("panel driver error: {0:?}")]
    Panel(E),
}

impl<E: core::fmt::Debug> HalError<E> {
    /// Whether this error came from the panel driver rather than the HAL.
    pub fn is_panel(&self) -> bool {
        matches!(self, HalError::Panel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_format() {
        assert_eq!(
            FrameError::OutOfBounds.to_string(),
            "rectangle out of bounds"
        );
        assert_eq!(
            HalError::<()>::Frame(FrameError::SizeMismatch {
                expected: 15_000,
                actual: 10
            })
            .to_string(),
            "buffer size mismatch: expected 15000 bytes, got 10"
        );
        assert_eq!(
            HalError::<()>::NotInitialized.to_string(),
            "display not initialised"
        );
        assert_eq!(
            HalError::<()>::BufferUnavailable.to_string(),
            "driver frame buffer already handed out"
        );
        assert_eq!(
            HalError::<u8>::Panel(7).to_string(),
            "panel driver error: 7"
        );
    }

    #[test]
    fn test_frame_error_converts() {
        let err: HalError<()> = FrameError::OutOfBounds.into();
        assert_eq!(err, HalError::Frame(FrameError::OutOfBounds));
        assert!(!err.is_panel());
        assert!(HalError::Panel(()).is_panel());
    }
}
