pub use crate::builder::SimulatorBuilder;
pub use crate::calendar::{Calendar, DaysOff};
pub use crate::cluster::{Cluster, ClusterType, ContactProfile, ContactProfiles};
pub use crate::config::SimulationConfig;
pub use crate::disease::{DiseaseDurations, DiseaseProfile};
pub use crate::error::StrideError;
pub use crate::health::{Health, HealthStatus};
pub use crate::infector::{
    ClusterOutcome, ContactObserver, Infector, InfectorPolicy, InformationPolicy, LogMode,
    Strategy,
};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::people::{Person, PersonId, Population};
pub use crate::random::{ContactDraws, RandomStream};
pub use crate::simulator::Simulator;
