use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which contact events are written to the contact log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum LogMode {
    #[default]
    None,
    Transmissions,
    /// Every contact of the survey participants.
    Contacts,
}

/// How people learn about the health of others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum InformationPolicy {
    /// Nobody exchanges information.
    #[default]
    None,
    /// Both sides of every contact update their beliefs from what they observe about each
    /// other.
    LocalDiscussion,
}

/// The contact algorithm used for every cluster of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Strategy {
    /// Every pair of present members, O(n²). Needed to observe every contact.
    AllPairs,
    /// Only infectious cases against susceptible members, using the health partition.
    Partitioned,
    /// Survey participants against every other present member.
    Survey,
}

/// The run-wide combination of policies. Resolved once into a [`Strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfectorPolicy {
    pub log_mode: LogMode,
    /// Only the index case is infectious: new infections end immediately.
    pub track_index_case: bool,
    pub information_policy: InformationPolicy,
}

impl InfectorPolicy {
    pub fn strategy(&self) -> Strategy {
        if self.information_policy == InformationPolicy::LocalDiscussion {
            Strategy::AllPairs
        } else if self.log_mode == LogMode::Contacts {
            Strategy::Survey
        } else {
            Strategy::Partitioned
        }
    }

    pub fn logs_transmissions(&self) -> bool {
        self.log_mode == LogMode::Transmissions
    }

    pub fn logs_contacts(&self) -> bool {
        self.log_mode == LogMode::Contacts
    }
}
