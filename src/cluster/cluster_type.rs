use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// The kinds of venue a person can be a member of. Each person belongs to at most one
/// cluster of each type.
///
/// The declaration order is the order in which the daily rounds visit the cluster types.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
)]
pub enum ClusterType {
    Household,
    School,
    Work,
    PrimaryCommunity,
    SecondaryCommunity,
}

impl ClusterType {
    /// All cluster types in round order.
    pub const ALL: [ClusterType; ClusterType::COUNT] = [
        ClusterType::Household,
        ClusterType::School,
        ClusterType::Work,
        ClusterType::PrimaryCommunity,
        ClusterType::SecondaryCommunity,
    ];

    /// Position of the type in [`ClusterType::ALL`], used to index per-type arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}
