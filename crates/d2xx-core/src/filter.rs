//! Filter engine
//!
//! A [`Filter`] pairs a variant predicate with an ordinal predicate. The
//! configured filters form an ordered list and a device is kept when it
//! matches any of them; an empty list keeps everything.
//!
//! Each filter selects at most one device per scan. Once a filter has accepted
//! a device it is marked in the scan's [`Claims`] and skipped for the rest of
//! the scan, so an any-index filter picks the first device of its variant not
//! already taken.
//!
//! The ordinal is the device's rank among devices of the same variant seen
//! earlier in the same scan, as handed out by [`OrdinalCounter`]. Decisions
//! depend only on the variant, that counter and the claims, so the same
//! devices in the same detection order always get the same decisions.
//!
//! # Filter strings
//!
//! ```text
//! ft232r      the first FT232R
//! ft232r:1    the second FT232R
//! any:0       the first device
//! *:-1        the first device (-1 means any index)
//! none        nothing
//! ```

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::DevType;

/// Raw ordinal value meaning "any index"
pub const ANY_INDEX: i64 = -1;

/// Raw ordinal value used when rendering [`FilterDeviceIdx::None`]
pub const NO_INDEX: i64 = -2;

/// Variant predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterDeviceType {
    /// Match every variant
    #[default]
    Any,
    /// Match no variant
    None,
    /// Match exactly this variant
    Only(DevType),
}

impl FilterDeviceType {
    /// Whether `dev_type` passes the predicate
    pub fn matches(self, dev_type: DevType) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::Only(wanted) => wanted == dev_type,
        }
    }
}

impl From<DevType> for FilterDeviceType {
    fn from(dev_type: DevType) -> Self {
        Self::Only(dev_type)
    }
}

/// Ordinal predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterDeviceIdx {
    /// Match every ordinal
    #[default]
    Any,
    /// Match no ordinal
    None,
    /// Match exactly this 0-based ordinal
    Index(usize),
}

impl FilterDeviceIdx {
    /// Build from the raw integer form: `-1` is any, `>= 0` an exact
    /// ordinal, any other negative value matches nothing
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            ANY_INDEX => Self::Any,
            n if n >= 0 => usize::try_from(n).map_or(Self::None, Self::Index),
            _ => Self::None,
        }
    }

    /// The raw integer form
    pub fn raw(self) -> i64 {
        match self {
            Self::Any => ANY_INDEX,
            Self::None => NO_INDEX,
            Self::Index(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }

    /// Whether `ordinal` passes the predicate
    pub fn matches(self, ordinal: usize) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::Index(wanted) => wanted == ordinal,
        }
    }
}

/// One filter: a variant predicate and an ordinal predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Filter {
    /// Variant predicate
    pub dev_type: FilterDeviceType,
    /// Ordinal predicate
    pub device_idx: FilterDeviceIdx,
}

impl Filter {
    /// A filter matching every device
    pub fn any() -> Self {
        Self::default()
    }

    /// A filter matching every device of one variant
    pub fn only(dev_type: DevType) -> Self {
        Self {
            dev_type: FilterDeviceType::Only(dev_type),
            device_idx: FilterDeviceIdx::Any,
        }
    }

    /// Restrict the filter to one ordinal
    pub fn index(mut self, ordinal: usize) -> Self {
        self.device_idx = FilterDeviceIdx::Index(ordinal);
        self
    }

    /// Set the ordinal predicate from its raw integer form
    pub fn raw_index(mut self, raw: i64) -> Self {
        self.device_idx = FilterDeviceIdx::from_raw(raw);
        self
    }

    /// Whether a device of `dev_type` with `ordinal` matches this filter
    pub fn matches(&self, dev_type: DevType, ordinal: usize) -> bool {
        self.dev_type.matches(dev_type) && self.device_idx.matches(ordinal)
    }
}

/// Outcome of evaluating a filter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the device
    Accept {
        /// Position of the first matching filter, `None` for an empty list
        filter: Option<usize>,
    },
    /// Skip the device
    Reject,
}

impl Decision {
    /// Whether the device is kept
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Filter positions that already accepted a device in one scan
#[derive(Debug, Clone, Default)]
pub struct Claims {
    taken: BTreeSet<usize>,
}

impl Claims {
    /// Create an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the filter at `pos` has accepted a device
    pub fn is_claimed(&self, pos: usize) -> bool {
        self.taken.contains(&pos)
    }

    /// Number of filters that have accepted a device
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// Forget every claim
    pub fn clear(&mut self) {
        self.taken.clear();
    }
}

/// Evaluate `filters` in order, skipping those already in `claims`; the first
/// full match wins and is claimed
///
/// An empty list accepts without claiming anything.
pub fn evaluate(
    filters: &[Filter],
    claims: &mut Claims,
    dev_type: DevType,
    ordinal: usize,
) -> Decision {
    if filters.is_empty() {
        return Decision::Accept { filter: None };
    }
    let found = filters
        .iter()
        .enumerate()
        .find(|(pos, f)| !claims.is_claimed(*pos) && f.matches(dev_type, ordinal))
        .map(|(pos, _)| pos);
    match found {
        Some(pos) => {
            claims.taken.insert(pos);
            Decision::Accept { filter: Some(pos) }
        }
        None => Decision::Reject,
    }
}

/// Per-variant ordinal counter for one scan
#[derive(Debug, Clone, Default)]
pub struct OrdinalCounter {
    seen: BTreeMap<DevType, usize>,
}

impl OrdinalCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the ordinal for the next device of `dev_type`
    pub fn next(&mut self, dev_type: DevType) -> usize {
        let count = self.seen.entry(dev_type).or_insert(0);
        let ordinal = *count;
        *count += 1;
        ordinal
    }

    /// How many devices of `dev_type` have been counted so far
    pub fn seen(&self, dev_type: DevType) -> usize {
        self.seen.get(&dev_type).copied().unwrap_or(0)
    }

    /// Forget every count
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// Error parsing a filter string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    /// The variant name is not known
    UnknownDevType(String),
    /// The ordinal is not an integer
    InvalidIndex(String),
    /// The string was empty
    Empty,
}

impl fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterParseError::UnknownDevType(s) => write!(f, "Unknown device type '{}'", s),
            FilterParseError::InvalidIndex(s) => write!(f, "Invalid device index '{}'", s),
            FilterParseError::Empty => write!(f, "Empty filter"),
        }
    }
}

impl std::error::Error for FilterParseError {}

impl FromStr for FilterDeviceType {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(FilterParseError::Empty),
            "any" | "*" => Ok(Self::Any),
            "none" => Ok(Self::None),
            name => DevType::parse(name)
                .map(Self::Only)
                .ok_or_else(|| FilterParseError::UnknownDevType(s.trim().to_string())),
        }
    }
}

impl FromStr for FilterDeviceIdx {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "*" => Ok(Self::Any),
            "none" => Ok(Self::None),
            raw => raw
                .parse::<i64>()
                .map(Self::from_raw)
                .map_err(|_| FilterParseError::InvalidIndex(s.trim().to_string())),
        }
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    /// Parse `<type>[:<index>]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dev_type, device_idx) = match s.split_once(':') {
            Some((t, i)) => (t.parse()?, i.parse()?),
            None => (s.parse()?, FilterDeviceIdx::Any),
        };
        Ok(Self {
            dev_type,
            device_idx,
        })
    }
}

impl fmt::Display for FilterDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::None => f.write_str("none"),
            Self::Only(t) => write!(f, "{}", t),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_idx {
            FilterDeviceIdx::Any => write!(f, "{}", self.dev_type),
            FilterDeviceIdx::None => write!(f, "{}:none", self.dev_type),
            FilterDeviceIdx::Index(n) => write!(f, "{}:{}", self.dev_type, n),
        }
    }
}
