use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::ArrayCreateError;

/// A compression library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Complib {
    /// zlib (deflate) compression.
    #[default]
    #[display("zlib")]
    Zlib,
    /// LZO compression.
    ///
    /// There is no LZO backend, so it always falls back to zlib.
    #[display("lzo")]
    Lzo,
    /// bzip2 compression.
    #[display("bzip2")]
    Bzip2,
    /// No compression.
    #[display("none")]
    None,
}

impl Complib {
    /// Return true if this library can be used by this build.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        match self {
            Self::Zlib => cfg!(feature = "zlib"),
            Self::Bzip2 => cfg!(feature = "bz2"),
            Self::Lzo => false,
            Self::None => true,
        }
    }
}

impl TryFrom<&str> for Complib {
    type Error = ArrayCreateError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        match name {
            "zlib" => Ok(Self::Zlib),
            "lzo" => Ok(Self::Lzo),
            "bzip2" => Ok(Self::Bzip2),
            "none" => Ok(Self::None),
            _ => Err(ArrayCreateError::InvalidFilters(format!(
                "unknown compression library {name}"
            ))),
        }
    }
}

/// The filters applied to every chunk of an earray.
///
/// The defaults are:
///  - `complevel`: `0` (no compression)
///  - `complib`: [`Complib::Zlib`]
///  - `shuffle`: `false`
///  - `fletcher32`: `false`
///
/// Filters are fixed when an array is created.
/// An unavailable compression library is substituted when the array is built, see [`Filters::resolve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    complevel: u8,
    complib: Complib,
    shuffle: bool,
    fletcher32: bool,
}

impl Filters {
    /// Create filters with no compression, no shuffle and no checksum.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compression level.
    #[must_use]
    pub const fn complevel(&self) -> u8 {
        self.complevel
    }

    /// Set the compression level (0 to 9). A level of zero disables compression.
    #[must_use]
    pub const fn with_complevel(mut self, complevel: u8) -> Self {
        self.complevel = complevel;
        self
    }

    /// Return the compression library.
    #[must_use]
    pub const fn complib(&self) -> Complib {
        self.complib
    }

    /// Set the compression library.
    #[must_use]
    pub const fn with_complib(mut self, complib: Complib) -> Self {
        self.complib = complib;
        self
    }

    /// Return the shuffle flag.
    #[must_use]
    pub const fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Set the shuffle flag.
    #[must_use]
    pub const fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Return the fletcher32 checksum flag.
    #[must_use]
    pub const fn fletcher32(&self) -> bool {
        self.fletcher32
    }

    /// Set the fletcher32 checksum flag.
    #[must_use]
    pub const fn with_fletcher32(mut self, fletcher32: bool) -> Self {
        self.fletcher32 = fletcher32;
        self
    }

    /// Return true if chunks are compressed.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.complevel > 0 && !matches!(self.complib, Complib::None)
    }

    /// Validate the filters and substitute an unavailable compression library.
    ///
    /// `lzo` is never available and `bzip2` requires the `bz2` feature.
    /// An unavailable library is replaced by `zlib` (or by no compression if `zlib` is also unavailable) and a warning is logged.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::InvalidFilters`] if the compression level is above 9.
    pub fn resolve(&self) -> Result<Self, ArrayCreateError> {
        if self.complevel > 9 {
            return Err(ArrayCreateError::InvalidFilters(format!(
                "compression level {} is not in the range 0 to 9",
                self.complevel
            )));
        }
        let mut filters = *self;
        if !filters.complib.is_available() {
            let fallback = if Complib::Zlib.is_available() {
                Complib::Zlib
            } else {
                Complib::None
            };
            log::warn!(
                "the {} compression library is not available, using {fallback} instead",
                filters.complib
            );
            filters.complib = fallback;
        }
        Ok(filters)
    }
}
