//! Size-estimate buckets
//!
//! Fixed bidirectional conversion table between calendar durations and issue
//! point estimates. Both directions are used: event intervals collapse to a
//! bucket, and issue points expand to a duration when an event is created.

use serde::{Deserialize, Serialize};

/// Ordinal size bucket shared by both external systems.
///
/// | bucket | minutes | points |
/// |--------|---------|--------|
/// | XS     | 15      | 1      |
/// | S      | 30      | 2      |
/// | M      | 60      | 3      |
/// | L      | 120     | 5      |
/// | XL     | 240     | 8      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeBucket {
    Xs,
    S,
    M,
    L,
    Xl,
}

impl SizeBucket {
    /// Canonical duration for this bucket, in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::Xs => 15,
            Self::S => 30,
            Self::M => 60,
            Self::L => 120,
            Self::Xl => 240,
        }
    }

    /// Issue-tracker point value for this bucket.
    #[must_use]
    pub const fn points(self) -> u8 {
        match self {
            Self::Xs => 1,
            Self::S => 2,
            Self::M => 3,
            Self::L => 5,
            Self::Xl => 8,
        }
    }

    /// Classify a raw duration into the nearest bucket.
    ///
    /// Thresholds are inclusive upper bounds: ≤22 → XS, ≤45 → S, ≤90 → M,
    /// ≤180 → L, anything longer → XL.
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0..=22 => Self::Xs,
            23..=45 => Self::S,
            46..=90 => Self::M,
            91..=180 => Self::L,
            _ => Self::Xl,
        }
    }

    /// Map an issue point estimate to its bucket.
    ///
    /// Unknown point values default to S, matching the fallback duration of
    /// [`crate::constants::DEFAULT_DURATION_MINUTES`].
    #[must_use]
    pub const fn from_points(points: Option<u8>) -> Self {
        match points {
            Some(1) => Self::Xs,
            Some(3) => Self::M,
            Some(5) => Self::L,
            Some(8) => Self::Xl,
            // 2, unknown values, and missing estimates all land on S
            _ => Self::S,
        }
    }
}

impl Default for SizeBucket {
    fn default() -> Self {
        Self::S
    }
}
