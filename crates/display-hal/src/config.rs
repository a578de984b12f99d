//! HAL runtime configuration

/// Runtime policy for [`HalDisplay`](crate::HalDisplay).
///
/// Hardware facts (geometry, waveform ids) are compile-time constants in the
/// `panel` crate; only caller policy lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HalConfig {
    /// Non-full refreshes after which
    /// [`needs_full_refresh`](crate::RefreshOrchestrator::needs_full_refresh)
    /// reports true (advisory, never acted on by the HAL).
    pub full_refresh_budget: u16,
}

impl HalConfig {
    /// Default configuration: a full refresh is advised every 10 updates.
    pub const DEFAULT: Self = Self {
        full_refresh_budget: 10,
    };

    /// Set the full refresh budget.
    #[must_use]
    pub const fn with_full_refresh_budget(mut self, budget: u16) -> Self {
        self.full_refresh_budget = budget;
        self
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
