//! Sort directions.

use std::fmt;
use std::str::FromStr;

use bson::Bson;

use crate::error::MongoError;

/// Sort direction for finds and aggregation stages.
///
/// Loosely typed input (`1`/`-1`, `"asc"`/`"desc"`) converts through
/// `TryFrom`; anything else is rejected with
/// [`MongoError::InvalidArgument`] before a query is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// The driver's numeric form, `1` or `-1`.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Whether this is ascending.
    pub fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

impl From<SortDirection> for Bson {
    fn from(direction: SortDirection) -> Self {
        Bson::Int32(direction.as_i32())
    }
}

impl TryFrom<i32> for SortDirection {
    type Error = MongoError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Ascending),
            -1 => Ok(Self::Descending),
            other => Err(MongoError::invalid_argument(format!(
                "sort direction must be 1 or -1, got {other}"
            ))),
        }
    }
}

impl FromStr for SortDirection {
    type Err = MongoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Ascending),
            "desc" | "descending" | "-1" => Ok(Self::Descending),
            _ => Err(MongoError::invalid_argument(format!(
                "unknown sort direction '{s}'"
            ))),
        }
    }
}

impl TryFrom<&str> for SortDirection {
    type Error = MongoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_directions() {
        assert_eq!(SortDirection::try_from(1).unwrap(), SortDirection::Ascending);
        assert_eq!(SortDirection::try_from(-1).unwrap(), SortDirection::Descending);
        assert!(SortDirection::try_from(0).unwrap_err().is_invalid_argument());
        assert!(SortDirection::try_from(2).is_err());
    }

    #[test]
    fn test_string_directions() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert_eq!(SortDirection::try_from("desc").unwrap(), SortDirection::Descending);
        assert_eq!("descending".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert!("sideways".parse::<SortDirection>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_wire_form() {
        assert_eq!(Bson::from(SortDirection::Ascending), Bson::Int32(1));
        assert_eq!(Bson::from(SortDirection::Descending), Bson::Int32(-1));
        assert_eq!(SortDirection::Ascending.reverse(), SortDirection::Descending);
        assert_eq!(SortDirection::Descending.to_string(), "desc");
    }
}
