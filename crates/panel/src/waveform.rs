//! Refresh waveforms
//!
//! Each waveform is a timed sequence of voltage pulses the controller applies
//! to every pixel. Faster waveforms skip the flashing phases that clear
//! residual charge, so they leave ghosting behind.

/// Waveform profile executed by the panel driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    /// Full refresh with OTP waveform (~3000ms)
    /// - Several black/white flashes
    /// - Clears all ghosting
    Full,

    /// Half refresh (~1700ms)
    /// - Single flash
    /// - Balanced quality and speed
    Half,

    /// Fast refresh with custom LUT (~500ms)
    /// - No flashing
    /// - Accumulates ghosting
    Fast,

    /// Four-level grayscale over both RAM planes (~1500ms)
    /// - Current RAM = LSB plane, Previous RAM = MSB plane
    Grayscale,
}

/// Visual quality tier of a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QualityTier {
    /// Visible ghosting likely.
    Low,
    /// Some ghosting, acceptable for periodic updates.
    Balanced,
    /// Ghosting-free.
    Best,
}

impl Waveform {
    /// All waveforms, in declaration order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Full,
        Waveform::Half,
        Waveform::Fast,
        Waveform::Grayscale,
    ];

    /// Stable identifier handed to the driver.
    ///
    /// This is the SSD1683 Display Update Control 2 (0x22) sequence byte.
    pub const fn id(self) -> u8 {
        match self {
            Waveform::Full => 0xF7,
            Waveform::Half => 0xD7,
            Waveform::Fast => 0xC7,
            Waveform::Grayscale => 0xCF,
        }
    }

    /// Look a waveform up by its identifier.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.id() == id)
    }

    /// Nominal time the panel stays busy, in milliseconds.
    pub const fn nominal_duration_ms(self) -> u32 {
        match self {
            Waveform::Full => 3000,
            Waveform::Half => 1700,
            Waveform::Fast => 500,
            Waveform::Grayscale => 1500,
        }
    }

    /// Visual quality tier.
    pub const fn quality(self) -> QualityTier {
        match self {
            Waveform::Full => QualityTier::Best,
            Waveform::Half | Waveform::Grayscale => QualityTier::Balanced,
            Waveform::Fast => QualityTier::Low,
        }
    }

    /// Whether this waveform leaves residual ghosting behind.
    pub const fn accumulates_ghosting(self) -> bool {
        !matches!(self, Waveform::Full)
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Full => "Full",
            Waveform::Half => "Half",
            Waveform::Fast => "Fast",
            Waveform::Grayscale => "Grayscale",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        for (i, a) in Waveform::ALL.iter().enumerate() {
            for b in Waveform::ALL.iter().skip(i + 1) {
                assert_ne!(a.id(), b.id(), "{a:?} and {b:?} share an id");
            }
        }
    }

    #[test]
    fn test_id_round_trip() {
        for w in Waveform::ALL {
            assert_eq!(Waveform::from_id(w.id()), Some(w));
        }
        assert_eq!(Waveform::from_id(0x00), None);
    }

    #[test]
    fn test_durations_order_by_quality() {
        assert!(Waveform::Full.nominal_duration_ms() > Waveform::Half.nominal_duration_ms());
        assert!(Waveform::Half.nominal_duration_ms() > Waveform::Fast.nominal_duration_ms());
        assert!(Waveform::Full.quality() > Waveform::Half.quality());
        assert!(Waveform::Half.quality() > Waveform::Fast.quality());
    }

    #[test]
    fn test_ghosting_properties() {
        assert!(!Waveform::Full.accumulates_ghosting());
        assert!(Waveform::Half.accumulates_ghosting());
        assert!(Waveform::Fast.accumulates_ghosting());
    }
}
