/// Listing status definitions
///
/// A single tagged enum carries both the persisted ordinal and the display name,
/// so backends never need a parallel lookup structure.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a listing
///
/// Every listing is created `Open`. The other states exist so they can be
/// persisted and read back, but nothing in this crate transitions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    Open,
    Pending,
    Sold,
    Closed,
}

impl ListingStatus {
    /// Returns all statuses in ordinal order
    pub fn all() -> [ListingStatus; 4] {
        [Self::Open, Self::Pending, Self::Sold, Self::Closed]
    }

    /// Ordinal used as the `statusId` key of the `listingStatus` table
    pub fn id(&self) -> i64 {
        match self {
            Self::Open => 1,
            Self::Pending => 2,
            Self::Sold => 3,
            Self::Closed => 4,
        }
    }

    /// Name stored in the `listingStatus.status` column
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Pending => "Pending",
            Self::Sold => "Sold",
            Self::Closed => "Closed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_open() {
        assert_eq!(ListingStatus::default(), ListingStatus::Open);
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let ids: Vec<i64> = ListingStatus::all().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_lookup_by_name() {
        for status in ListingStatus::all() {
            assert_eq!(ListingStatus::from_name(status.name()), Some(status));
        }
        assert_eq!(ListingStatus::from_name("open"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ListingStatus::Sold), "Sold");
    }
}
