//! Stepping through siblings and numeric property values.

use serde::{Deserialize, Serialize};

use crate::document::LayerMode;

/// How to pick an item among siblings. Index 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectType {
    First,
    Last,
    Previous,
    Next,
    SkipPrevious,
    SkipNext,
    Set(usize),
}

/// Items skipped by `SkipPrevious` and `SkipNext`.
const SKIP: i64 = 10;

impl SelectType {
    /// The index to select among `count` items when `current` is selected.
    /// The result is clamped to the valid range; `count` must be positive.
    pub fn select_index(self, current: usize, count: usize) -> usize {
        let last = count.saturating_sub(1) as i64;
        let current = current as i64;
        let index = match self {
            SelectType::First => 0,
            SelectType::Last => last,
            SelectType::Previous => current - 1,
            SelectType::Next => current + 1,
            SelectType::SkipPrevious => current - SKIP,
            SelectType::SkipNext => current + SKIP,
            SelectType::Set(index) => index.min(i64::MAX as usize) as i64,
        };
        index.clamp(0, last) as usize
    }
}

/// How to change a numeric property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectValue {
    SetToDefault,
    First,
    Last,
    SmallPrevious,
    SmallNext,
    Previous,
    Next,
    SkipPrevious,
    SkipNext,
    /// An absolute value, clamped to the range.
    Set(f64),
}

/// Bounds and step sizes of a numeric property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub small_step: f64,
    pub step: f64,
    pub skip_step: f64,
}

impl ValueRange {
    pub const OPACITY: ValueRange = ValueRange {
        min: 0.0,
        max: 1.0,
        default: 1.0,
        small_step: 1.0 / 255.0,
        step: 0.01,
        skip_step: 0.1,
    };

    /// Positions in [`LayerMode::ALL`].
    pub const MODE_INDEX: ValueRange = ValueRange {
        min: 0.0,
        max: (LayerMode::ALL.len() - 1) as f64,
        default: 0.0,
        small_step: 0.0,
        step: 1.0,
        skip_step: 1.0,
    };

    /// Apply `action` to `current`, clamping to the range.
    pub fn select(&self, action: SelectValue, current: f64) -> f64 {
        let value = match action {
            SelectValue::SetToDefault => self.default,
            SelectValue::First => self.min,
            SelectValue::Last => self.max,
            SelectValue::SmallPrevious => current - self.small_step,
            SelectValue::SmallNext => current + self.small_step,
            SelectValue::Previous => current - self.step,
            SelectValue::Next => current + self.step,
            SelectValue::SkipPrevious => current - self.skip_step,
            SelectValue::SkipNext => current + self.skip_step,
            SelectValue::Set(value) => value,
        };
        if value.is_nan() {
            return current;
        }
        value.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_index() {
        assert_eq!(SelectType::First.select_index(3, 5), 0);
        assert_eq!(SelectType::Last.select_index(0, 5), 4);
        assert_eq!(SelectType::Previous.select_index(3, 5), 2);
        assert_eq!(SelectType::Next.select_index(3, 5), 4);
        assert_eq!(SelectType::Next.select_index(4, 5), 4);
        assert_eq!(SelectType::Previous.select_index(0, 5), 0);
        assert_eq!(SelectType::SkipNext.select_index(1, 30), 11);
        assert_eq!(SelectType::SkipPrevious.select_index(4, 30), 0);
        assert_eq!(SelectType::Set(2).select_index(0, 5), 2);
        assert_eq!(SelectType::Set(99).select_index(0, 5), 4);
    }

    #[test]
    fn test_opacity_steps() {
        let r = ValueRange::OPACITY;
        assert_eq!(r.select(SelectValue::SetToDefault, 0.2), 1.0);
        assert_eq!(r.select(SelectValue::First, 0.2), 0.0);
        assert!((r.select(SelectValue::Next, 0.5) - 0.51).abs() < 1e-9);
        assert!((r.select(SelectValue::SkipPrevious, 0.5) - 0.4).abs() < 1e-9);
        assert!((r.select(SelectValue::SmallNext, 0.0) - 1.0 / 255.0).abs() < 1e-9);
        assert_eq!(r.select(SelectValue::Next, 1.0), 1.0);
        assert_eq!(r.select(SelectValue::Set(-3.0), 0.5), 0.0);
        assert_eq!(r.select(SelectValue::Set(f64::NAN), 0.5), 0.5);
    }

    #[test]
    fn test_mode_steps_clamp() {
        let r = ValueRange::MODE_INDEX;
        assert_eq!(r.select(SelectValue::Next, 0.0), 1.0);
        assert_eq!(r.select(SelectValue::Next, 24.0), 24.0);
        assert_eq!(r.select(SelectValue::Previous, 0.0), 0.0);
        assert_eq!(r.select(SelectValue::Last, 3.0), 24.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Selected indices are always in range
            #[test]
            fn prop_index_in_range(current in 0usize..100, count in 1usize..100, set in 0usize..200) {
                let current = current.min(count - 1);
                for select in [
                    SelectType::First,
                    SelectType::Last,
                    SelectType::Previous,
                    SelectType::Next,
                    SelectType::SkipPrevious,
                    SelectType::SkipNext,
                    SelectType::Set(set),
                ] {
                    prop_assert!(select.select_index(current, count) < count);
                }
            }

            /// Opacity never leaves 0..=1
            #[test]
            fn prop_opacity_in_range(current in 0.0f64..=1.0, set in -10.0f64..10.0) {
                for action in [
                    SelectValue::SmallPrevious,
                    SelectValue::SmallNext,
                    SelectValue::SkipPrevious,
                    SelectValue::SkipNext,
                    SelectValue::Set(set),
                ] {
                    let v = ValueRange::OPACITY.select(action, current);
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }
}
