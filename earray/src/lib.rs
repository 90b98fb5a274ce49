//! `earray` is a Rust library for chunked, append-only N-dimensional arrays that are extensible along one dimension.
//!
//! An extensible array ([`EArray`](crate::array::EArray)) has exactly one *extensible dimension*, which has zero size on creation and grows as rows are appended.
//! Rows are stored in chunks of a fixed number of rows, and each chunk passes through an optional filter pipeline:
//! - byte shuffling,
//! - compression with zlib or bzip2, and
//! - a fletcher32 checksum.
//!
//! Arrays support NumPy style slicing with negative indices, steps and an ellipsis, buffered row iteration, copying a range of rows to a new array, and truncation.
//!
//! ## Getting Started
//! - Create arrays with an [`ArrayBuilder`](crate::array::ArrayBuilder), or manage the arrays of a store with a [`File`](crate::file::File).
//! - Any store implementing the [`earray_storage`] traits can hold arrays, such as the in-memory [`MemoryStore`](crate::storage::store::MemoryStore) or the [`FilesystemStore`](crate::filesystem::FilesystemStore).
//!
//! ## Logging
//! `earray` logs information and warnings using the [`log`] crate.
//! A warning is logged when an unavailable compression library is substituted, and chunk writes and erasures are logged at the debug level.
//! A logging implementation must be enabled to capture logs.
//! See the [`log`] crate documentation for more details.
//!
//! ## Examples
#![cfg_attr(feature = "ndarray", doc = "```rust")]
#![cfg_attr(not(feature = "ndarray"), doc = "```rust,ignore")]
//! # use std::sync::Arc;
//! use earray::array::{ArrayBuilder, AtomKind, Complib, Filters, RowRange};
//! use earray::indexer::{AxisSelector, SliceSpec};
//!
//! let store = Arc::new(earray::storage::store::MemoryStore::new());
//!
//! // An array of rows of 3 float64 elements, extensible along the first dimension
//! let mut array = ArrayBuilder::new(vec![0, 3], AtomKind::Float64)
//!     .chunk_rows(2)
//!     .filters(Filters::new().with_complevel(5).with_complib(Complib::Zlib).with_shuffle(true))
//!     .build(store.clone(), "/earray1")?;
//! array.store_metadata()?;
//!
//! array.append(ndarray::array![[0.0, 0.1, 0.2], [1.0, 1.1, 1.2], [2.0, 2.1, 2.2]])?;
//! array.append(ndarray::array![[3.0, 3.1, 3.2]])?;
//! assert_eq!(array.nrows(), 4);
//!
//! // Every second row
//! let rows = array.read_ndarray::<f64>(RowRange::new(Some(0), Some(4), Some(2)))?;
//! assert_eq!(rows, ndarray::array![[0.0, 0.1, 0.2], [2.0, 2.1, 2.2]].into_dyn());
//!
//! // The last column of the last two rows
//! let column = array.get_item_elements::<f64>(&[
//!     AxisSelector::Slice(SliceSpec::new(Some(-2), None, None)),
//!     AxisSelector::Index(-1),
//! ])?;
//! assert_eq!(column, vec![2.2, 3.2]);
//!
//! // Store the buffered last chunk and the metadata
//! array.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `filesystem`: Re-export [`earray_filesystem`] as [`earray::filesystem`](crate::filesystem).
//!  - `ndarray`: [`ndarray`] flavor, conversions and utility functions for [`EArray`](crate::array::EArray).
//!  - Compression libraries: `zlib`, `bz2`.
//!
//! ## Licence
//! `earray` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod array;
pub mod attributes;
pub mod file;
pub mod indexer;
pub mod node;

#[cfg(feature = "filesystem")]
pub use earray_filesystem as filesystem;
pub use earray_storage as storage;
