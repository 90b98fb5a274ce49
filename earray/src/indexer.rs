//! Selection resolution.
//!
//! A [`ShapeIndexer`] resolves a selection of per-axis [`AxisSelector`]s against the shape of an earray into a [`ResolvedSelection`]: one normalised `(start, stop, step)` triple per axis plus the output shape.
//!
//! Selections follow the Python/NumPy conventions:
//!  - negative indices count from the end of an axis,
//!  - slice bounds are clamped to the axis,
//!  - a `None` slice bound means the start or end of the axis (depending on the sign of the step),
//!  - a single [`AxisSelector::Ellipsis`] expands to as many full-axis selectors as needed, and
//!  - missing trailing selectors are treated as full-axis selectors.
//!
//! Bulk row reads use the distinct [`RowRange`] call shape, where a `None` stop selects a single row.

mod resolved;
mod row_range;
mod selector;

pub use resolved::{ResolvedAxis, ResolvedSelection};
pub use row_range::RowRange;
pub use selector::{AxisSelector, SliceSpec, selection_to_string};

use thiserror::Error;

/// An error resolving a selection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexerError {
    /// More than one ellipsis was given.
    #[error("only a single ellipsis is allowed in a selection")]
    MultipleEllipsis,
    /// More selectors than array dimensions.
    #[error("too many indices: {given} given for an array of rank {rank}")]
    TooManyIndices {
        /// The number of non-ellipsis selectors.
        given: usize,
        /// The rank of the array.
        rank: usize,
    },
    /// A slice step of zero.
    #[error("slice step cannot be zero")]
    ZeroStep,
    /// A row range step that is not positive.
    #[error("row range step must be positive, got {_0}")]
    NonPositiveStep(i64),
    /// An integer index outside of an axis.
    #[error("index {index} is out of bounds for axis {axis} with size {len}")]
    OutOfBounds {
        /// The axis.
        axis: usize,
        /// The index.
        index: i64,
        /// The size of the axis.
        len: u64,
    },
    /// A row range start beyond the last row.
    #[error("start {start} is beyond the last row (nrows {nrows})")]
    StartBeyondExtent {
        /// The start row.
        start: i64,
        /// The number of rows.
        nrows: u64,
    },
    /// A write selection that reaches beyond the rows of the extensible dimension.
    #[error("selection {bound} on the extensible axis {axis} is beyond nrows {nrows}, use append to add rows")]
    BeyondExtent {
        /// The extensible axis.
        axis: usize,
        /// The offending bound.
        bound: i64,
        /// The number of rows.
        nrows: u64,
    },
    /// A dimension too large to index.
    #[error("axis {axis} with size {len} is too large to index")]
    AxisTooLarge {
        /// The axis.
        axis: usize,
        /// The size of the axis.
        len: u64,
    },
}

/// Resolves selections against the logical shape of an earray.
#[derive(Clone, Debug)]
pub struct ShapeIndexer<'a> {
    shape: &'a [u64],
    extdim: usize,
}

impl<'a> ShapeIndexer<'a> {
    /// Create a new indexer for an array with `shape` whose extensible dimension is `extdim`.
    ///
    /// `shape` holds the current number of rows at `extdim`.
    #[must_use]
    pub const fn new(shape: &'a [u64], extdim: usize) -> Self {
        Self { shape, extdim }
    }

    /// Return the rank of the indexed array.
    #[must_use]
    pub const fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Expand an ellipsis and pad missing trailing selectors so there is one selector per axis.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if there is more than one ellipsis or more selectors than axes.
    pub fn expand(&self, selection: &[AxisSelector]) -> Result<Vec<AxisSelector>, IndexerError> {
        let ellipses = selection
            .iter()
            .filter(|selector| matches!(selector, AxisSelector::Ellipsis))
            .count();
        if ellipses > 1 {
            return Err(IndexerError::MultipleEllipsis);
        }
        let given = selection.len() - ellipses;
        if given > self.rank() {
            return Err(IndexerError::TooManyIndices {
                given,
                rank: self.rank(),
            });
        }

        let fill = self.rank() - given;
        let mut expanded = Vec::with_capacity(self.rank());
        for selector in selection {
            if matches!(selector, AxisSelector::Ellipsis) {
                expanded.extend(std::iter::repeat_n(AxisSelector::Full, fill));
            } else {
                expanded.push(*selector);
            }
        }
        if ellipses == 0 {
            expanded.extend(std::iter::repeat_n(AxisSelector::Full, fill));
        }
        Ok(expanded)
    }

    /// Resolve a selection for reading.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the selection is malformed or an integer index is out of bounds.
    pub fn resolve(&self, selection: &[AxisSelector]) -> Result<ResolvedSelection, IndexerError> {
        let axes = self
            .expand(selection)?
            .iter()
            .zip(self.shape)
            .enumerate()
            .map(|(axis, (selector, &len))| ResolvedAxis::resolve(selector, axis, len))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedSelection::new(axes))
    }

    /// Resolve a selection for writing.
    ///
    /// This is [`resolve`](ShapeIndexer::resolve) with the additional constraint that explicit bounds on the extensible dimension must lie within the current rows.
    /// Writes never extend the extensible dimension.
    ///
    /// # Errors
    /// Returns [`IndexerError`] if the selection is malformed, out of bounds, or reaches beyond the rows of the extensible dimension.
    pub fn resolve_write(
        &self,
        selection: &[AxisSelector],
    ) -> Result<ResolvedSelection, IndexerError> {
        let expanded = self.expand(selection)?;
        if let Some(AxisSelector::Slice(slice)) = expanded.get(self.extdim) {
            let nrows = self.shape[self.extdim];
            let nrows_i = i128::from(nrows);
            for bound in [slice.start, slice.stop].into_iter().flatten() {
                let bound_i = i128::from(bound);
                if bound_i > nrows_i || bound_i < -nrows_i {
                    return Err(IndexerError::BeyondExtent {
                        axis: self.extdim,
                        bound,
                        nrows,
                    });
                }
            }
        }
        self.resolve(&expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> AxisSelector {
        AxisSelector::Slice(SliceSpec::new(start, stop, step))
    }

    #[test]
    fn indexer_ellipsis_expansion() {
        let shape = [2, 3, 4, 10];
        let indexer = ShapeIndexer::new(&shape, 3);
        let with_ellipsis = indexer
            .resolve(&[
                slice(Some(1), Some(2), Some(1)),
                AxisSelector::Ellipsis,
                slice(Some(1), Some(4), Some(2)),
            ])
            .unwrap();
        let explicit = indexer
            .resolve(&[
                slice(Some(1), Some(2), Some(1)),
                AxisSelector::Full,
                AxisSelector::Full,
                slice(Some(1), Some(4), Some(2)),
            ])
            .unwrap();
        assert_eq!(with_ellipsis, explicit);
        assert_eq!(with_ellipsis.shape(), vec![1, 3, 4, 2]);

        let trailing = indexer.resolve(&[AxisSelector::Index(1)]).unwrap();
        assert_eq!(trailing.shape(), vec![3, 4, 10]);
    }

    #[test]
    fn indexer_determinism() {
        let shape = [7, 50];
        let indexer = ShapeIndexer::new(&shape, 1);
        let selection = [AxisSelector::Index(-1), slice(Some(3), None, Some(10))];
        let first = indexer.resolve(&selection).unwrap();
        let second = indexer.resolve(&selection).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.axes()[1].indices().collect::<Vec<_>>(), vec![3, 13, 23, 33, 43]);
        assert_eq!(first.axes()[0].indices().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn indexer_errors() {
        let shape = [2, 3, 10];
        let indexer = ShapeIndexer::new(&shape, 2);
        assert_eq!(
            indexer.resolve(&[AxisSelector::Ellipsis, AxisSelector::Ellipsis]),
            Err(IndexerError::MultipleEllipsis)
        );
        assert_eq!(
            indexer.resolve(&[AxisSelector::Full; 4]),
            Err(IndexerError::TooManyIndices { given: 4, rank: 3 })
        );
        assert_eq!(
            indexer.resolve(&[slice(None, None, Some(0))]),
            Err(IndexerError::ZeroStep)
        );
        assert_eq!(
            indexer.resolve(&[AxisSelector::Index(2)]),
            Err(IndexerError::OutOfBounds {
                axis: 0,
                index: 2,
                len: 2
            })
        );
        assert!(indexer.resolve(&[AxisSelector::Index(-3)]).is_err());
    }

    #[test]
    fn indexer_empty_ranges() {
        let shape = [10];
        let indexer = ShapeIndexer::new(&shape, 0);
        let resolved = indexer.resolve(&[slice(Some(6), Some(2), None)]).unwrap();
        assert!(resolved.is_empty());
        let resolved = indexer.resolve(&[slice(Some(2), Some(6), Some(-1))]).unwrap();
        assert!(resolved.is_empty());
        let resolved = indexer.resolve(&[slice(Some(6), Some(-1), None)]).unwrap();
        assert_eq!(resolved.axes()[0].indices().collect::<Vec<_>>(), vec![6, 7, 8]);
        let resolved = indexer.resolve(&[slice(Some(-3), Some(-1), None)]).unwrap();
        assert_eq!(resolved.axes()[0].indices().collect::<Vec<_>>(), vec![7, 8]);
    }

    #[test]
    fn indexer_write_bounds() {
        let shape = [2, 10];
        let indexer = ShapeIndexer::new(&shape, 1);
        assert!(indexer.resolve_write(&[AxisSelector::Full, slice(Some(0), Some(10), None)]).is_ok());
        assert!(indexer.resolve_write(&[AxisSelector::Full, AxisSelector::Full]).is_ok());
        assert_eq!(
            indexer.resolve_write(&[AxisSelector::Full, slice(Some(5), Some(12), None)]),
            Err(IndexerError::BeyondExtent {
                axis: 1,
                bound: 12,
                nrows: 10
            })
        );
        assert!(indexer.resolve_write(&[AxisSelector::Full, AxisSelector::Index(10)]).is_err());
        // fixed dimensions clamp as for reads
        assert_eq!(
            indexer
                .resolve_write(&[slice(Some(0), Some(5), None)])
                .unwrap()
                .shape(),
            vec![2, 10]
        );
    }
}
