//! Experience points and the derived level tier.
//!
//! Level is a pure function of experience and is recomputed on every read;
//! it is never stored. Experience is monotonic: the only mutation is a
//! saturating grant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Experience granted for saving a new diary entry.
pub const ENTRY_SAVE_AWARD: u64 = 10;

/// Non-negative, monotonically increasing experience score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Experience(u64);

impl Experience {
    /// Wrap a raw point total.
    pub fn new(points: u64) -> Self {
        Self(points)
    }

    /// Current point total.
    pub fn points(&self) -> u64 {
        self.0
    }

    /// Return the score after granting `amount` points.
    pub fn granted(&self, amount: u64) -> Self {
        Self(self.0.saturating_add(amount))
    }

    /// Level tier: `floor(sqrt(exp / 10)) + 1`.
    pub fn level(&self) -> u32 {
        let scaled = self.0 / 10;
        // Integer square root by search keeps this exact for large totals.
        let mut root = (scaled as f64).sqrt() as u64;
        while (root + 1) * (root + 1) <= scaled {
            root += 1;
        }
        while root * root > scaled {
            root -= 1;
        }
        u32::try_from(root).unwrap_or(u32::MAX - 1) + 1
    }
}

impl From<u64> for Experience {
    fn from(points: u64) -> Self {
        Self(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(9, 1)]
    #[case(10, 2)]
    #[case(39, 2)]
    #[case(40, 3)]
    #[case(90, 4)]
    #[case(1000, 11)]
    fn level_matches_formula(#[case] points: u64, #[case] expected: u32) {
        assert_eq!(Experience::new(points).level(), expected);
    }

    #[test]
    fn level_is_monotonic() {
        let mut previous = 0;
        for points in 0..2_000 {
            let level = Experience::new(points).level();
            assert!(level >= previous, "level dropped at {points}");
            previous = level;
        }
    }

    #[test]
    fn grant_is_monotonic_and_saturating() {
        let exp = Experience::new(5).granted(ENTRY_SAVE_AWARD);
        assert_eq!(exp.points(), 15);
        let max = Experience::new(u64::MAX).granted(ENTRY_SAVE_AWARD);
        assert_eq!(max.points(), u64::MAX);
    }
}
