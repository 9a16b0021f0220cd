//! Social contact clusters and the contact-rate tables they share.
mod cluster;
mod cluster_type;
mod contact_profile;

pub use cluster::{Cluster, GeoCoordinate};
pub use cluster_type::ClusterType;
pub use contact_profile::{effective_age, ContactProfile, ContactProfiles, MAXIMUM_AGE};
