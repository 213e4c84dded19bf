//! Client library for the Eskom load shedding API.
//!
//! # Overview
//!
//! Eskom publishes the current load shedding stage, region lists, and
//! per-suburb outage schedules. The list endpoints speak JSON; the schedule
//! endpoint renders HTML and has to be scraped. This crate wraps all of it
//! behind one [`Client`] and turns the scraped schedule fragments into a
//! normalized [`Schedule`](model::Schedule): windows deduplicated across
//! stages (highest stage wins), grouped by day, chronologically sorted.
//!
//! # Example
//!
//! ```no_run
//! use chrono_tz::Africa::Johannesburg;
//! use loadshedding::{Client, GetScheduleRequest};
//!
//! # async fn run() -> Result<(), loadshedding::Error> {
//! let client = Client::new(Johannesburg);
//!
//! let stage = client.get_status().await?;
//! println!("current stage: {stage:?}");
//!
//! let schedule = client
//!     .get_schedule(GetScheduleRequest {
//!         suburb_id: "64106".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! for day in &schedule.days {
//!     for slot in &day.slots {
//!         println!("{} for {} ({:?})", slot.start, slot.duration, slot.stage);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`client`]: the HTTP client and per-endpoint request types
//! - [`model`]: stages, regions, and the normalized schedule types
//! - [`error`]: the crate error type
//!
//! Schedule parsing and reconciliation are internal; they are exercised
//! through [`Client::get_schedule`].

pub mod client;
pub mod error;
pub mod model;

mod parse;
mod schedule;

pub use client::{
    Client, GetMunicipalitySuburbsRequest, GetScheduleRequest, SearchSuburbsRequest,
    DEFAULT_SCHEDULE_STAGES,
};
pub use error::{Error, Result};
pub use model::{
    Municipality, Province, Schedule, ScheduleDay, SearchSuburb, Stage, Suburb, TimeSlot,
};
