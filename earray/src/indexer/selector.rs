use std::fmt::Display;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

/// A Python-style slice with optional `start`, `stop` and `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SliceSpec {
    /// The first index, or the start (end for a negative step) of the axis if `None`.
    pub start: Option<i64>,
    /// The index one past the last, or the end (start for a negative step) of the axis if `None`.
    pub stop: Option<i64>,
    /// The step, or `1` if `None`.
    pub step: Option<i64>,
}

impl SliceSpec {
    /// Create a new slice.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// A slice covering a whole axis.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(None, None, None)
    }

    /// Set the step.
    #[must_use]
    pub const fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }
}

impl Display for SliceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        write!(f, ":")?;
        if let Some(stop) = self.stop {
            write!(f, "{stop}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl From<Range<i64>> for SliceSpec {
    fn from(range: Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<i64>> for SliceSpec {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for SliceSpec {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// A selector for one axis, or an ellipsis standing in for several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisSelector {
    /// A single index. The axis is dropped from the output shape.
    Index(i64),
    /// A slice.
    Slice(SliceSpec),
    /// The whole axis.
    Full,
    /// Any number of whole axes.
    Ellipsis,
}

impl Display for AxisSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Slice(slice) => write!(f, "{slice}"),
            Self::Full => write!(f, ":"),
            Self::Ellipsis => write!(f, "..."),
        }
    }
}

impl From<i64> for AxisSelector {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<SliceSpec> for AxisSelector {
    fn from(slice: SliceSpec) -> Self {
        Self::Slice(slice)
    }
}

impl From<Range<i64>> for AxisSelector {
    fn from(range: Range<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFrom<i64>> for AxisSelector {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeTo<i64>> for AxisSelector {
    fn from(range: RangeTo<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFull> for AxisSelector {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

/// Format a selection as a Python-style index expression, e.g. `[1:2:1, ..., 2]`.
#[must_use]
pub fn selection_to_string(selection: &[AxisSelector]) -> String {
    format!(
        "[{}]",
        itertools::Itertools::join(&mut selection.iter(), ", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_display() {
        let selection = [
            AxisSelector::from(SliceSpec::new(Some(1), Some(2), Some(1))),
            AxisSelector::Ellipsis,
            AxisSelector::from(-1),
            AxisSelector::from(..),
            AxisSelector::from(3..),
        ];
        assert_eq!(selection_to_string(&selection), "[1:2:1, ..., -1, :, 3:]");
        assert_eq!(SliceSpec::from(..4).with_step(2).to_string(), ":4:2");
    }
}
