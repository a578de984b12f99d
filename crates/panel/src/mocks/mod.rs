//! Mock implementations for testing
//!
//! [`MockPanel`] records every driver call in order and simulates the
//! controller's two RAM planes, so HAL tests can assert on call order,
//! waveform selection and the exact bytes that reached the panel.

use crate::driver::{PanelDriver, RamPlane};
use crate::geometry::BUFFER_SIZE;
use crate::waveform::Waveform;

/// Kind of driver operation, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOp {
    /// [`PanelDriver::initialize`]
    Initialize,
    /// [`PanelDriver::transfer`]
    Transfer,
    /// [`PanelDriver::write_plane`]
    WritePlane,
    /// [`PanelDriver::activate`]
    Activate,
    /// [`PanelDriver::enter_deep_sleep`]
    EnterDeepSleep,
}

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCall {
    /// Controller reset / configuration.
    Initialize,
    /// Buffer pushed and latched with a waveform.
    Transfer {
        /// Waveform used.
        waveform: Waveform,
        /// Copy of the buffer as it was transferred.
        data: Vec<u8>,
    },
    /// RAM plane written without refresh.
    WritePlane {
        /// Target plane.
        plane: RamPlane,
        /// Copy of the data written.
        data: Vec<u8>,
    },
    /// Waveform run over RAM as-is.
    Activate(Waveform),
    /// Deep sleep entered.
    EnterDeepSleep,
}

impl PanelCall {
    /// The operation kind of this call.
    pub fn op(&self) -> PanelOp {
        match self {
            PanelCall::Initialize => PanelOp::Initialize,
            PanelCall::Transfer { .. } => PanelOp::Transfer,
            PanelCall::WritePlane { .. } => PanelOp::WritePlane,
            PanelCall::Activate(_) => PanelOp::Activate,
            PanelCall::EnterDeepSleep => PanelOp::EnterDeepSleep,
        }
    }
}

/// Error produced by an injected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockPanelError {
    /// The operation was scheduled to fail (simulated bus timeout).
    Injected(PanelOp),
}

impl core::fmt::Display for MockPanelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Injected(op) => write!(f, "injected failure in {op:?}"),
        }
    }
}

impl std::error::Error for MockPanelError {}

/// Mock panel driver
pub struct MockPanel {
    buffer_len: Option<usize>,
    calls: Vec<PanelCall>,
    ram_current: Vec<u8>,
    ram_previous: Vec<u8>,
    fail_next: Option<PanelOp>,
}

impl MockPanel {
    /// Create a mock that allocates a correctly sized buffer.
    pub fn new() -> Self {
        Self::with_buffer_len(BUFFER_SIZE)
    }

    /// Create a mock whose allocation is `len` bytes (for size-mismatch tests).
    pub fn with_buffer_len(len: usize) -> Self {
        Self {
            buffer_len: Some(len),
            calls: Vec::new(),
            ram_current: vec![0xFF; BUFFER_SIZE],
            ram_previous: vec![0xFF; BUFFER_SIZE],
            fail_next: None,
        }
    }

    /// Create a mock whose frame buffer was already handed out elsewhere.
    pub fn without_buffer() -> Self {
        Self {
            buffer_len: None,
            ..Self::new()
        }
    }

    /// Make the next call of kind `op` fail with [`MockPanelError::Injected`].
    pub fn fail_next(&mut self, op: PanelOp) {
        self.fail_next = Some(op);
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> &[PanelCall] {
        &self.calls
    }

    /// Operation kinds of all recorded calls, oldest first.
    pub fn ops(&self) -> Vec<PanelOp> {
        self.calls.iter().map(PanelCall::op).collect()
    }

    /// Waveforms of all recorded transfers, oldest first.
    pub fn transfers(&self) -> Vec<Waveform> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PanelCall::Transfer { waveform, .. } => Some(*waveform),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls (RAM contents are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Simulated contents of a controller RAM plane.
    pub fn ram(&self, plane: RamPlane) -> &[u8] {
        match plane {
            RamPlane::Current => &self.ram_current,
            RamPlane::Previous => &self.ram_previous,
        }
    }

    fn check(&mut self, op: PanelOp) -> Result<(), MockPanelError> {
        if self.fail_next == Some(op) {
            self.fail_next = None;
            return Err(MockPanelError::Injected(op));
        }
        Ok(())
    }

    fn store(&mut self, plane: RamPlane, data: &[u8]) {
        let ram = match plane {
            RamPlane::Current => &mut self.ram_current,
            RamPlane::Previous => &mut self.ram_previous,
        };
        ram.clear();
        ram.extend_from_slice(data);
    }
}

impl Default for MockPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelDriver for MockPanel {
    type Error = MockPanelError;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.check(PanelOp::Initialize)?;
        self.calls.push(PanelCall::Initialize);
        Ok(())
    }

    fn allocate_buffer(&mut self) -> Option<&'static mut [u8]> {
        // Handed out once, like a static buffer. Test-only: the allocation
        // lives for the rest of the test process.
        self.buffer_len
            .take()
            .map(|len| Box::leak(vec![0xFF; len].into_boxed_slice()))
    }

    fn transfer(&mut self, buffer: &[u8], waveform: Waveform) -> Result<(), Self::Error> {
        self.check(PanelOp::Transfer)?;
        self.store(RamPlane::Current, buffer);
        self.calls.push(PanelCall::Transfer {
            waveform,
            data: buffer.to_vec(),
        });
        Ok(())
    }

    fn write_plane(&mut self, plane: RamPlane, data: &[u8]) -> Result<(), Self::Error> {
        self.check(PanelOp::WritePlane)?;
        self.store(plane, data);
        self.calls.push(PanelCall::WritePlane {
            plane,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn activate(&mut self, waveform: Waveform) -> Result<(), Self::Error> {
        self.check(PanelOp::Activate)?;
        self.calls.push(PanelCall::Activate(waveform));
        Ok(())
    }

    fn enter_deep_sleep(&mut self) -> Result<(), Self::Error> {
        self.check(PanelOp::EnterDeepSleep)?;
        self.calls.push(PanelCall::EnterDeepSleep);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls_in_order() {
        let mut panel = MockPanel::new();
        panel.initialize().unwrap();
        panel.transfer(&[0u8; 4], Waveform::Fast).unwrap();
        panel.enter_deep_sleep().unwrap();

        assert_eq!(
            panel.ops(),
            vec![PanelOp::Initialize, PanelOp::Transfer, PanelOp::EnterDeepSleep]
        );
        assert_eq!(panel.transfers(), vec![Waveform::Fast]);
    }

    #[test]
    fn test_mock_failure_is_one_shot() {
        let mut panel = MockPanel::new();
        panel.fail_next(PanelOp::Transfer);

        assert_eq!(
            panel.transfer(&[], Waveform::Full),
            Err(MockPanelError::Injected(PanelOp::Transfer))
        );
        assert!(panel.calls().is_empty(), "failed call must not be recorded");
        assert!(panel.transfer(&[], Waveform::Full).is_ok());
    }

    #[test]
    fn test_mock_ram_planes() {
        let mut panel = MockPanel::new();
        panel.write_plane(RamPlane::Previous, &[0xAA; 3]).unwrap();
        panel.transfer(&[0x55; 2], Waveform::Half).unwrap();

        assert_eq!(panel.ram(RamPlane::Previous), &[0xAA; 3]);
        assert_eq!(panel.ram(RamPlane::Current), &[0x55; 2]);
    }

    #[test]
    fn test_mock_allocation_size() {
        let mut panel = MockPanel::with_buffer_len(100);
        assert_eq!(panel.allocate_buffer().unwrap().len(), 100);
        assert!(panel.allocate_buffer().is_none(), "handed out once");
        assert_eq!(
            MockPanel::new().allocate_buffer().unwrap().len(),
            BUFFER_SIZE
        );
        assert!(MockPanel::without_buffer().allocate_buffer().is_none());
    }
}
