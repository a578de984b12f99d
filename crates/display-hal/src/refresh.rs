//! Refresh orchestration
//!
//! Maps caller-chosen [`RefreshMode`]s onto panel waveforms and pushes the
//! frame buffer. Mode choice stays with the caller: Full after many fast
//! updates to clear ghosting, Half for periodic updates, Fast for
//! interactive ones. The orchestrator only keeps advisory counters.

use panel::{PanelDriver, Waveform};

/// Mono refresh mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshMode {
    /// Full refresh (~3000ms)
    /// - Several flashes, clears all ghosting
    /// - Use for: page transitions, periodic cleanup
    Full,

    /// Half refresh (~1700ms)
    /// - Single flash
    /// - Use for: balanced periodic updates
    Half,

    /// Fast refresh (~500ms)
    /// - No flashing, accumulates ghosting
    /// - Use for: page turns, interactive updates
    #[default]
    Fast,
}

impl RefreshMode {
    /// All modes, in declaration order.
    pub const ALL: [RefreshMode; 3] = [RefreshMode::Full, RefreshMode::Half, RefreshMode::Fast];

    /// Waveform executed for this mode.
    pub const fn waveform(self) -> Waveform {
        match self {
            RefreshMode::Full => Waveform::Full,
            RefreshMode::Half => Waveform::Half,
            RefreshMode::Fast => Waveform::Fast,
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        self.waveform().name()
    }
}

/// Orchestrator state.
///
/// `Transferring` only holds inside the blocking [`RefreshOrchestrator::run`]
/// call. Anything that can borrow the orchestrator observes `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshState {
    /// No transfer in progress.
    #[default]
    Idle,
    /// Transfer with this mode in progress.
    Transferring(RefreshMode),
}

/// Advisory refresh counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshStats {
    /// Successful refreshes of any waveform.
    pub total: u32,
    /// Ghosting refreshes (Half, Fast, Grayscale) since the last Full.
    pub since_full: u16,
}

/// Drives mono refreshes and keeps ghosting statistics.
#[derive(Debug, Clone)]
pub struct RefreshOrchestrator {
    state: RefreshState,
    stats: RefreshStats,
    full_refresh_budget: u16,
}

impl RefreshOrchestrator {
    /// Create an idle orchestrator advising a full refresh every
    /// `full_refresh_budget` ghosting refreshes.
    pub const fn new(full_refresh_budget: u16) -> Self {
        Self {
            state: RefreshState::Idle,
            stats: RefreshStats {
                total: 0,
                since_full: 0,
            },
            full_refresh_budget,
        }
    }

    /// Current state. Internal bookkeeping: refreshes block, so this is
    /// always `Idle` when a caller can read it.
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    /// Whether enough ghosting refreshes accumulated to warrant a Full one.
    pub fn needs_full_refresh(&self) -> bool {
        self.stats.since_full >= self.full_refresh_budget
    }

    /// Transfer `buffer` with `mode`'s waveform, blocking until latched.
    ///
    /// State returns to `Idle` whether or not the driver succeeds; failures
    /// are not counted.
    pub fn run<D: PanelDriver>(
        &mut self,
        driver: &mut D,
        buffer: &[u8],
        mode: RefreshMode,
    ) -> Result<(), D::Error> {
        self.state = RefreshState::Transferring(mode);
        let result = driver.transfer(buffer, mode.waveform());
        self.state = RefreshState::Idle;
        result?;
        self.record(mode.waveform());
        Ok(())
    }

    /// Count a successful refresh with `waveform`.
    pub fn record(&mut self, waveform: Waveform) {
        self.stats.total = self.stats.total.saturating_add(1);
        if waveform.accumulates_ghosting() {
            self.stats.since_full = self.stats.since_full.saturating_add(1);
        } else {
            self.stats.since_full = 0;
        }
    }
}

impl Default for RefreshOrchestrator {
    fn default() -> Self {
        Self::new(crate::HalConfig::DEFAULT.full_refresh_budget)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use panel::mocks::{MockPanel, PanelOp};

    #[test]
    fn test_mode_waveforms_distinct() {
        let ids: Vec<u8> = RefreshMode::ALL.iter().map(|m| m.waveform().id()).collect();
        assert_eq!(ids, vec![0xF7, 0xD7, 0xC7]);
        assert_eq!(RefreshMode::default(), RefreshMode::Fast);
        assert_eq!(RefreshMode::Half.name(), "Half");
    }

    #[test]
    fn test_run_transfers_and_counts() {
        let mut panel = MockPanel::new();
        let mut orch = RefreshOrchestrator::new(2);

        orch.run(&mut panel, &[0xFF; 4], RefreshMode::Fast).unwrap();
        assert_eq!(orch.state(), RefreshState::Idle);
        assert!(!orch.needs_full_refresh());

        orch.run(&mut panel, &[0xFF; 4], RefreshMode::Half).unwrap();
        assert!(orch.needs_full_refresh());

        orch.run(&mut panel, &[0xFF; 4], RefreshMode::Full).unwrap();
        assert!(!orch.needs_full_refresh());
        assert_eq!(
            orch.stats(),
            RefreshStats {
                total: 3,
                since_full: 0
            }
        );
        assert_eq!(
            panel.transfers(),
            vec![Waveform::Fast, Waveform::Half, Waveform::Full]
        );
    }

    #[test]
    fn test_failed_transfer_returns_to_idle() {
        let mut panel = MockPanel::new();
        panel.fail_next(PanelOp::Transfer);
        let mut orch = RefreshOrchestrator::default();

        assert!(orch.run(&mut panel, &[0xFF; 4], RefreshMode::Full).is_err());
        assert_eq!(orch.state(), RefreshState::Idle);
        assert_eq!(orch.stats(), RefreshStats::default());
    }

    #[test]
    fn test_grayscale_counts_as_ghosting() {
        let mut orch = RefreshOrchestrator::default();
        orch.record(Waveform::Grayscale);
        assert_eq!(orch.stats().since_full, 1);
    }
}
