//! Data models for the load shedding client.
//!
//! Two families of types live here:
//!
//! - JSON wire types decoded from the list/lookup endpoints
//!   ([`Municipality`], [`Suburb`], [`SearchSuburb`])
//! - The normalized schedule produced by reconciling scraped stage views
//!   ([`Schedule`], [`ScheduleDay`], [`TimeSlot`])
//!
//! All schedule timestamps carry the timezone the [`crate::Client`] was
//! configured with.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Load shedding severity level.
///
/// Totally ordered: a higher stage means more severe and more frequent
/// outages, with `Unknown` below everything else.
///
/// The upstream status endpoint reports stages as a shifted numeric code
/// (`"1"` = not shedding, `"2"` = stage 1, ..., `"9"` = stage 8); use
/// [`Stage::from_status_code`] to map it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Status code was not recognized.
    Unknown,

    /// No load shedding in effect.
    NotShedding,

    Stage1,
    Stage2,
    Stage3,
    Stage4,
    Stage5,
    Stage6,
    Stage7,
    Stage8,
}

impl Stage {
    /// Map a raw status code from the `GetStatus` endpoint to a stage.
    ///
    /// Unrecognized codes map to [`Stage::Unknown`]; surrounding whitespace
    /// is ignored.
    pub fn from_status_code(code: &str) -> Self {
        match code.trim() {
            "1" => Stage::NotShedding,
            "2" => Stage::Stage1,
            "3" => Stage::Stage2,
            "4" => Stage::Stage3,
            "5" => Stage::Stage4,
            "6" => Stage::Stage5,
            "7" => Stage::Stage6,
            "8" => Stage::Stage7,
            "9" => Stage::Stage8,
            _ => Stage::Unknown,
        }
    }

    /// Numeric id used in the schedule URL path.
    ///
    /// Offset from the human stage number: stage 1 is id 3, stage 8 is
    /// id 10. `Unknown` has no valid id and yields -1.
    pub fn schedule_id(&self) -> i32 {
        match self {
            Stage::Unknown => -1,
            Stage::NotShedding => 2,
            Stage::Stage1 => 3,
            Stage::Stage2 => 4,
            Stage::Stage3 => 5,
            Stage::Stage4 => 6,
            Stage::Stage5 => 7,
            Stage::Stage6 => 8,
            Stage::Stage7 => 9,
            Stage::Stage8 => 10,
        }
    }
}

/// South African province, identified upstream by a numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Province {
    EasternCape,
    FreeState,
    Gauteng,
    KwazuluNatal,
    Limpopo,
    Mpumalanga,
    NorthWest,
    NorthernCape,
    WesternCape,
}

impl Province {
    /// Numeric id used by the municipality endpoint.
    pub fn id(&self) -> u8 {
        match self {
            Province::EasternCape => 1,
            Province::FreeState => 2,
            Province::Gauteng => 3,
            Province::KwazuluNatal => 4,
            Province::Limpopo => 5,
            Province::Mpumalanga => 6,
            Province::NorthWest => 7,
            Province::NorthernCape => 8,
            Province::WesternCape => 9,
        }
    }
}

/// A municipality within a province.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    /// Municipality id, used to list its suburbs.
    #[serde(default, rename = "Value")]
    pub id: String,

    /// Municipality name.
    #[serde(default, rename = "Text")]
    pub name: String,
}

/// A suburb as returned by the paged municipality listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suburb {
    /// Suburb id, used to fetch its schedule.
    #[serde(default)]
    pub id: String,

    /// Suburb name.
    #[serde(default, rename = "text")]
    pub name: String,

    /// Number of schedule records upstream; 0 means no schedule exists.
    #[serde(default, rename = "Tot")]
    pub total: i64,
}

/// A suburb as returned by the free-text search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSuburb {
    /// Suburb id, used to fetch its schedule.
    #[serde(default, rename = "Id")]
    pub id: i64,

    /// Number of schedule records upstream; 0 means no schedule exists.
    #[serde(default, rename = "Total")]
    pub total: i64,

    /// Name of the municipality the suburb belongs to.
    #[serde(default, rename = "MunicipalityName")]
    pub municipality: String,

    /// Name of the province the suburb belongs to.
    #[serde(default, rename = "ProvinceName")]
    pub province: String,

    /// Suburb name.
    #[serde(default, rename = "Name")]
    pub suburb: String,
}

/// One contiguous outage window on one day under one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// Start of the outage, in the configured timezone.
    pub start: DateTime<Tz>,

    /// Length of the outage; always positive. Windows crossing midnight
    /// (e.g. `20:00 - 00:30`) end on the following day.
    pub duration: Duration,

    /// The highest stage this window was reported under.
    pub stage: Stage,
}

impl TimeSlot {
    /// End of the outage, in the configured timezone.
    pub fn end(&self) -> DateTime<Tz> {
        self.start + self.duration
    }
}

/// All outage windows for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDay {
    /// Midnight of the day, in the configured timezone.
    pub date: DateTime<Tz>,

    /// Outage windows, sorted by start time, duplicates collapsed.
    pub slots: Vec<TimeSlot>,
}

/// A reconciled outage schedule for one suburb.
///
/// Days are sorted ascending with at most one entry per calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Days with at least one outage window, in date order.
    pub days: Vec<ScheduleDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_status_code() {
        assert_eq!(Stage::from_status_code("1"), Stage::NotShedding);
        assert_eq!(Stage::from_status_code("2"), Stage::Stage1);
        assert_eq!(Stage::from_status_code("5"), Stage::Stage4);
        assert_eq!(Stage::from_status_code("9"), Stage::Stage8);
    }

    #[test]
    fn test_stage_from_status_code_unrecognized() {
        assert_eq!(Stage::from_status_code("0"), Stage::Unknown);
        assert_eq!(Stage::from_status_code("10"), Stage::Unknown);
        assert_eq!(Stage::from_status_code(""), Stage::Unknown);
        assert_eq!(Stage::from_status_code("stage 2"), Stage::Unknown);
    }

    #[test]
    fn test_stage_from_status_code_trims_whitespace() {
        assert_eq!(Stage::from_status_code(" 2\n"), Stage::Stage1);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Unknown < Stage::NotShedding);
        assert!(Stage::NotShedding < Stage::Stage1);
        assert!(Stage::Stage1 < Stage::Stage3);
        assert!(Stage::Stage3 < Stage::Stage8);
    }

    #[test]
    fn test_stage_schedule_id() {
        assert_eq!(Stage::Unknown.schedule_id(), -1);
        assert_eq!(Stage::NotShedding.schedule_id(), 2);
        assert_eq!(Stage::Stage1.schedule_id(), 3);
        assert_eq!(Stage::Stage8.schedule_id(), 10);
    }

    #[test]
    fn test_province_ids() {
        assert_eq!(Province::EasternCape.id(), 1);
        assert_eq!(Province::Limpopo.id(), 5);
        assert_eq!(Province::WesternCape.id(), 9);
    }
}
