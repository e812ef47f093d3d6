//! Path filter configuration.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

/// How the patterns of a [`FilterSpec`] are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub enum FilterMode {
    /// Only paths matching at least one pattern are selected.
    #[cfg_attr(feature = "minicbor", n(0))]
    Include,

    /// Paths matching any pattern are dropped.
    #[default]
    #[cfg_attr(feature = "minicbor", n(1))]
    Exclude,
}

impl FilterMode {
    /// Lowercase name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Include => "include",
            FilterMode::Exclude => "exclude",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter mode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(
    feature = "std",
    error("unknown filter mode '{0}', expected 'include' or 'exclude'")
)]
pub struct UnknownFilterMode(pub String);

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("include") => Ok(FilterMode::Include),
            s if s.eq_ignore_ascii_case("exclude") => Ok(FilterMode::Exclude),
            other => Err(UnknownFilterMode(other.into())),
        }
    }
}

/// Which measurement paths are extracted.
///
/// A pattern is either an exact path (`environment.wind.speedApparent`) or a
/// dot-delimited prefix followed by `*` (`environment.*`). Patterns match the
/// base path of a measurement, before source or sub-field expansion.
///
/// The default spec excludes nothing, so every path is selected.
///
/// # Example
///
/// ```rust
/// use batchpoints_types::{FilterMode, FilterSpec};
///
/// let filter = FilterSpec::include(["environment.*", "navigation.speedOverGround"]);
/// assert_eq!(filter.mode, FilterMode::Include);
/// assert_eq!(filter.patterns.len(), 2);
///
/// assert!(FilterSpec::default().patterns.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct FilterSpec {
    /// Include or exclude.
    #[cfg_attr(feature = "minicbor", n(0))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: FilterMode,

    /// Ordered glob patterns.
    #[cfg_attr(feature = "minicbor", n(1))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub patterns: Vec<String>,
}

impl FilterSpec {
    /// Create a filter with an explicit mode.
    pub fn new<I, S>(mode: FilterMode, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Select only the paths matched by `patterns`.
    pub fn include<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterMode::Include, patterns)
    }

    /// Select every path not matched by `patterns`.
    pub fn exclude<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterMode::Exclude, patterns)
    }

    /// A filter that selects every path.
    pub fn all() -> Self {
        Self::default()
    }
}
