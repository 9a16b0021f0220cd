//! The simulated date, and which days people stay home from work or school.
use chrono::{Datelike, NaiveDate, Weekday};
use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone)]
pub struct Calendar {
    simulation_day: u32,
    date: NaiveDate,
    holidays: Vec<NaiveDate>,
    school_holidays: Vec<NaiveDate>,
}

impl Calendar {
    pub fn new(
        start_date: NaiveDate,
        holidays: Vec<NaiveDate>,
        school_holidays: Vec<NaiveDate>,
    ) -> Calendar {
        Calendar {
            simulation_day: 0,
            date: start_date,
            holidays,
            school_holidays,
        }
    }

    pub fn advance_day(&mut self) {
        self.simulation_day += 1;
        // A NaiveDate only runs out around the year 262143.
        if let Some(next) = self.date.succ_opt() {
            self.date = next;
        }
        trace!("advanced calendar to {} (day {})", self.date, self.simulation_day);
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Number of days since the start of the simulation.
    pub fn simulation_day(&self) -> u32 {
        self.simulation_day
    }

    /// Restores the day counter and date of a checkpoint.
    pub fn set_simulation_day(&mut self, simulation_day: u32, date: NaiveDate) {
        self.simulation_day = simulation_day;
        self.date = date;
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self) -> bool {
        self.holidays.contains(&self.date)
    }

    pub fn is_school_holiday(&self) -> bool {
        self.school_holidays.contains(&self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum DaysOff {
    /// Weekends and holidays are days off.
    #[default]
    Standard,
    /// Every day is a working and school day.
    None,
}

impl DaysOff {
    pub fn is_work_off(self, calendar: &Calendar) -> bool {
        match self {
            DaysOff::Standard => calendar.is_weekend() || calendar.is_holiday(),
            DaysOff::None => false,
        }
    }

    pub fn is_school_off(self, calendar: &Calendar) -> bool {
        match self {
            DaysOff::Standard => {
                calendar.is_weekend() || calendar.is_holiday() || calendar.is_school_holiday()
            }
            DaysOff::None => false,
        }
    }
}
