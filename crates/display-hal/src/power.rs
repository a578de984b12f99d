//! Panel power control
//!
//! ```text
//! (uninitialised) ──begin──► Active ──deep_sleep──► Sleeping
//!                              ▲                        │
//!                              └──────── wake ──────────┘
//! ```
//!
//! Deep sleep keeps the image on the glass but drops controller
//! configuration, so leaving it re-runs driver initialisation.

use panel::PanelDriver;

/// Panel power state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Panel powered and configured.
    #[default]
    Active,
    /// Panel in deep sleep.
    Sleeping,
}

/// Tracks and drives [`PowerState`] transitions.
#[derive(Debug, Clone, Default)]
pub struct PowerController {
    state: PowerState,
}

impl PowerController {
    /// A controller for a freshly initialised (active) panel.
    pub const fn new() -> Self {
        Self {
            state: PowerState::Active,
        }
    }

    /// Current state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Whether the panel can accept transfers.
    pub fn is_active(&self) -> bool {
        self.state == PowerState::Active
    }

    /// Put the panel to sleep. Already sleeping → `Ok(false)`, no driver call.
    ///
    /// Returns whether a transition happened.
    pub fn sleep<D: PanelDriver>(&mut self, driver: &mut D) -> Result<bool, D::Error> {
        if self.state == PowerState::Sleeping {
            return Ok(false);
        }
        driver.enter_deep_sleep()?;
        self.state = PowerState::Sleeping;
        Ok(true)
    }

    /// Wake the panel by re-initialising it. Already active → `Ok(false)`.
    ///
    /// Returns whether a transition happened.
    pub fn wake<D: PanelDriver>(&mut self, driver: &mut D) -> Result<bool, D::Error> {
        if self.state == PowerState::Active {
            return Ok(false);
        }
        driver.initialize()?;
        self.state = PowerState::Active;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use panel::mocks::{MockPanel, PanelOp};

    #[test]
    fn test_sleep_is_idempotent() {
        let mut panel = MockPanel::new();
        let mut power = PowerController::new();

        assert!(power.sleep(&mut panel).unwrap());
        assert!(!power.sleep(&mut panel).unwrap());
        assert_eq!(power.state(), PowerState::Sleeping);
        assert_eq!(panel.ops(), vec![PanelOp::EnterDeepSleep]);
    }

    #[test]
    fn test_wake_reinitialises() {
        let mut panel = MockPanel::new();
        let mut power = PowerController::new();

        assert!(!power.wake(&mut panel).unwrap(), "active → no-op");
        power.sleep(&mut panel).unwrap();
        assert!(power.wake(&mut panel).unwrap());
        assert!(power.is_active());
        assert_eq!(
            panel.ops(),
            vec![PanelOp::EnterDeepSleep, PanelOp::Initialize]
        );
    }

    #[test]
    fn test_failed_sleep_stays_active() {
        let mut panel = MockPanel::new();
        panel.fail_next(PanelOp::EnterDeepSleep);
        let mut power = PowerController::new();

        assert!(power.sleep(&mut panel).is_err());
        assert_eq!(power.state(), PowerState::Active);
    }
}
