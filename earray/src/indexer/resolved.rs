use std::fmt::Display;

use super::{AxisSelector, IndexerError, SliceSpec};

/// A selector resolved against one axis.
///
/// The selected indices are `start`, `start + step`, ... (`len` indices in total).
/// `stop` is the normalised exclusive bound, which is `-1` for a negative step reaching index zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedAxis {
    start: i64,
    stop: i64,
    step: i64,
    len: u64,
    collapsed: bool,
}

impl ResolvedAxis {
    /// Resolve `selector` against an axis of size `len`.
    ///
    /// # Errors
    /// Returns [`IndexerError`] for a zero step, an out of bounds index, or an ellipsis (which must be expanded first).
    pub fn resolve(selector: &AxisSelector, axis: usize, len: u64) -> Result<Self, IndexerError> {
        let len_i = i64::try_from(len).map_err(|_| IndexerError::AxisTooLarge { axis, len })?;
        match selector {
            AxisSelector::Index(index) => {
                let normalised = if *index < 0 { index + len_i } else { *index };
                if normalised < 0 || normalised >= len_i {
                    return Err(IndexerError::OutOfBounds {
                        axis,
                        index: *index,
                        len,
                    });
                }
                Ok(Self {
                    start: normalised,
                    stop: normalised + 1,
                    step: 1,
                    len: 1,
                    collapsed: true,
                })
            }
            AxisSelector::Slice(slice) => Self::resolve_slice(slice, len_i),
            AxisSelector::Full | AxisSelector::Ellipsis => {
                Self::resolve_slice(&SliceSpec::full(), len_i)
            }
        }
    }

    /// Resolve a slice against an axis of size `len` following Python's `slice.indices`.
    pub(crate) fn resolve_slice(slice: &SliceSpec, len: i64) -> Result<Self, IndexerError> {
        let step = slice.step.unwrap_or(1);
        if step == 0 {
            return Err(IndexerError::ZeroStep);
        }
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |value: i64| {
            if value < 0 {
                (value.saturating_add(len)).max(lower)
            } else {
                value.min(upper)
            }
        };
        let start = slice
            .start
            .map_or(if step < 0 { upper } else { lower }, clamp);
        let stop = slice
            .stop
            .map_or(if step < 0 { lower } else { upper }, clamp);

        let count = if step < 0 {
            if stop < start {
                (start - stop - 1) / (-step) + 1
            } else {
                0
            }
        } else if start < stop {
            (stop - start - 1) / step + 1
        } else {
            0
        };
        Ok(Self {
            start,
            stop,
            step,
            len: count.unsigned_abs(),
            collapsed: false,
        })
    }

    /// Return the first selected index.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Return the normalised exclusive stop.
    #[must_use]
    pub const fn stop(&self) -> i64 {
        self.stop
    }

    /// Return the step.
    #[must_use]
    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Return the number of selected indices.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Return true if no indices are selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return true if the axis was selected by a single index and is dropped from the output shape.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Return the `len` indices starting `offset` indices into the axis, as an uncollapsed axis.
    ///
    /// The result is clamped to the indices of the axis.
    #[must_use]
    pub fn sub_range(&self, offset: u64, len: u64) -> Self {
        let offset = offset.min(self.len);
        let len = len.min(self.len - offset);
        let start = self.start + self.step * offset.cast_signed();
        Self {
            start,
            stop: start + self.step * len.cast_signed(),
            step: self.step,
            len,
            collapsed: false,
        }
    }

    /// Return an iterator over the selected indices.
    ///
    /// The iterator yields [`len`](Self::len) indices.
    pub fn indices(&self) -> impl Iterator<Item = u64> + Clone + use<> {
        let (start, step) = (self.start, self.step);
        // all selected indices are within the axis, so they are non-negative
        (0..self.len).map(move |k| start.unsigned_abs().wrapping_add_signed(step * k.cast_signed()))
    }
}

impl Display for ResolvedAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.collapsed {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}:{}", self.start, self.stop, self.step)
        }
    }
}

/// A selection resolved against every axis of an array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedSelection {
    axes: Vec<ResolvedAxis>,
}

impl ResolvedSelection {
    /// Create a resolved selection from resolved axes.
    #[must_use]
    pub fn new(axes: Vec<ResolvedAxis>) -> Self {
        Self { axes }
    }

    /// Return the resolved axes.
    #[must_use]
    pub fn axes(&self) -> &[ResolvedAxis] {
        &self.axes
    }

    /// Return the output shape, which excludes collapsed axes.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        self.axes
            .iter()
            .filter(|axis| !axis.is_collapsed())
            .map(ResolvedAxis::len)
            .collect()
    }

    /// Return the number of selected indices of every axis, including collapsed axes.
    #[must_use]
    pub fn lens(&self) -> Vec<u64> {
        self.axes.iter().map(ResolvedAxis::len).collect()
    }

    /// Return the number of selected elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.axes.iter().map(ResolvedAxis::len).product()
    }

    /// Return true if no elements are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.iter().any(ResolvedAxis::is_empty)
    }
}

impl Display for ResolvedSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", itertools::Itertools::join(&mut self.axes.iter(), ", "))
    }
}
