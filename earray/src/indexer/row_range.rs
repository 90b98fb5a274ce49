use std::fmt::Display;

use super::{IndexerError, ResolvedAxis, SliceSpec};

/// A range of rows along the extensible dimension, used by bulk reads, row iteration and copies.
///
/// A row range differs from a [`SliceSpec`] in two ways:
///  - if `start` is given and `stop` is `None`, only the single row `start` is selected (`start == -1` selects the last row), and
///  - the step must be positive.
///
/// Otherwise negative bounds count from the end and bounds are clamped to the rows, as for a slice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RowRange {
    /// The first row, or `0` if `None`.
    pub start: Option<i64>,
    /// The row one past the last, see [`RowRange`] for the meaning of `None`.
    pub stop: Option<i64>,
    /// The step, or `1` if `None`.
    pub step: Option<i64>,
}

impl RowRange {
    /// Create a new row range.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// A row range covering every row.
    #[must_use]
    pub const fn all() -> Self {
        Self::new(None, None, None)
    }

    /// A row range over `start..stop` with a step of one.
    #[must_use]
    pub const fn span(start: i64, stop: i64) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// Resolve the row range against `nrows` rows.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the step is not positive, or if a single row `start` is at or beyond `nrows` of a non-empty array.
    pub fn resolve(&self, nrows: u64) -> Result<ResolvedAxis, IndexerError> {
        let step = self.step.unwrap_or(1);
        if step <= 0 {
            return Err(IndexerError::NonPositiveStep(step));
        }
        let nrows_i = i64::try_from(nrows)
            .map_err(|_| IndexerError::AxisTooLarge { axis: 0, len: nrows })?;

        let mut stop = self.stop;
        if let (Some(start), None) = (self.start, self.stop) {
            if nrows > 0 && start >= nrows_i {
                return Err(IndexerError::StartBeyondExtent { start, nrows });
            }
            stop = Some(if start == -1 { nrows_i } else { start + 1 });
        }
        ResolvedAxis::resolve_slice(&SliceSpec::new(self.start, stop, Some(step)), nrows_i)
    }
}

impl Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |value: Option<i64>| value.map_or_else(|| "None".to_string(), |v| v.to_string());
        write!(
            f,
            "({}, {}, {})",
            bound(self.start),
            bound(self.stop),
            bound(self.step)
        )
    }
}

impl From<std::ops::Range<i64>> for RowRange {
    fn from(range: std::ops::Range<i64>) -> Self {
        Self::span(range.start, range.end)
    }
}
