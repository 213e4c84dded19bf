//! Error types for the load shedding client.
//!
//! There is no partial-success mode anywhere in the crate: the first error
//! aborts the whole call. Parse errors are non-retriable (they indicate
//! upstream markup drift); transport errors are propagated unchanged after
//! the built-in retries are exhausted.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::model::Stage;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Duration text was present but contained no `HH:MM - HH:MM` range.
    #[error("no time range found in slot text {0:?}")]
    InvalidSlotFormat(String),

    /// A day-month token did not match the expected `Mon, 07 Sep` shape.
    #[error("invalid day-month token {token:?}")]
    DateParse {
        /// The raw token as scraped from the markup.
        token: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A clock time did not match the expected `HH:MM` shape.
    #[error("invalid clock time {token:?}")]
    TimeParse {
        /// The raw clock-time text.
        token: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A parsed local datetime does not exist (or is ambiguous) in the
    /// configured timezone.
    #[error("local time {datetime} is invalid or ambiguous in {timezone}")]
    InvalidLocalTime {
        datetime: NaiveDateTime,
        timezone: Tz,
    },

    /// A parse failure while reconciling a schedule, annotated with the
    /// stage and day token that triggered it.
    #[error("failed to parse schedule for {stage:?}, day {token:?}")]
    Schedule {
        stage: Stage,
        token: String,
        #[source]
        source: Box<Error>,
    },

    /// Transport-level failure from the HTTP layer.
    #[error("request failed")]
    Fetch(#[from] reqwest::Error),

    /// `search_suburbs` was called with an empty search term.
    #[error("search parameter cannot be empty")]
    EmptySearch,
}
