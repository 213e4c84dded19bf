//! Parsing of the scraped schedule markup.
//!
//! The schedule endpoint renders HTML, not JSON. Each `.scheduleDay` block
//! carries a day-month token (e.g. `Mon, 07 Sep`, never a year) and the
//! day's outage windows as anchor text. Windows may be glued together with
//! no separator (`04:00 - 08:3020:00 - 00:30`), so extraction works on the
//! concatenated text and a fixed-width time-range pattern.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::model::{ScheduleDay, Stage, TimeSlot};
use crate::schedule::StageObservation;

/// Matches one `HH:MM - HH:MM` outage window.
static SLOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2}:\d{2}) - (\d{2}:\d{2})").expect("slot pattern compiles"));

static SCHEDULE_DAY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".scheduleDay").expect("schedule day selector parses"));

static DAY_MONTH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".dayMonth").expect("day month selector parses"));

static SLOT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("slot link selector parses"));

/// Pull the per-day (day-token, duration-text) fragments for one stage out
/// of the schedule markup.
///
/// Days whose duration text is empty have no outage under this stage and
/// are skipped; that is not an error.
pub(crate) fn extract_day_fragments(html: &str, stage: Stage) -> Vec<StageObservation> {
    let document = Html::parse_document(html);

    let mut fragments = Vec::new();

    for day in document.select(&SCHEDULE_DAY) {
        let day_token = collect_text(day, &DAY_MONTH);
        let duration_text = collect_text(day, &SLOT_LINK);

        if duration_text.is_empty() {
            continue;
        }

        fragments.push(StageObservation {
            stage,
            day_token,
            duration_text,
        });
    }

    fragments
}

/// Concatenated text of every element matching `selector`, trimmed.
///
/// Concatenation across matches is load-bearing: sibling anchors each hold
/// one window and the glued result is what the slot pattern scans.
fn collect_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .flat_map(|e| e.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse one (day-token, duration-text) observation into a dated
/// [`ScheduleDay`] with every slot tagged with `stage`.
///
/// The token never carries a year, so the caller supplies the target year.
/// The abbreviated weekday is ignored; only day-of-month and month name are
/// load-bearing.
pub(crate) fn parse_schedule_day(
    year: i32,
    day_token: &str,
    duration_text: &str,
    tz: Tz,
    stage: Stage,
) -> Result<ScheduleDay> {
    let date = parse_day_token(day_token, year)?;
    let slots = parse_slots(date, duration_text, tz, stage)?;

    Ok(ScheduleDay {
        date: resolve_local(date.and_time(NaiveTime::MIN), tz)?,
        slots,
    })
}

/// Extract every outage window from `text` onto `date`.
///
/// Returns `InvalidSlotFormat` when no window pattern matches: the caller
/// only passes text it expected to contain at least one window.
pub(crate) fn parse_slots(
    date: NaiveDate,
    text: &str,
    tz: Tz,
    stage: Stage,
) -> Result<Vec<TimeSlot>> {
    let mut slots = Vec::new();

    for window in SLOT_PATTERN.captures_iter(text) {
        let start = resolve_local(date.and_time(parse_clock(&window[1])?), tz)?;
        let mut end = resolve_local(date.and_time(parse_clock(&window[2])?), tz)?;

        // Window crosses midnight; the end belongs to the next day.
        if end <= start {
            end += Duration::hours(24);
        }

        slots.push(TimeSlot {
            start,
            duration: end - start,
            stage,
        });
    }

    if slots.is_empty() {
        return Err(Error::InvalidSlotFormat(text.to_string()));
    }

    Ok(slots)
}

/// Parse a `Mon, 07 Sep` token into a date in the target year.
fn parse_day_token(token: &str, year: i32) -> Result<NaiveDate> {
    let day_month = match token.split_once(',') {
        Some((_weekday, rest)) => rest.trim(),
        None => token.trim(),
    };

    NaiveDate::parse_from_str(&format!("{day_month} {year}"), "%d %b %Y").map_err(|source| {
        Error::DateParse {
            token: token.to_string(),
            source,
        }
    })
}

/// Parse an `HH:MM` clock time.
fn parse_clock(token: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(token, "%H:%M").map_err(|source| Error::TimeParse {
        token: token.to_string(),
        source,
    })
}

fn resolve_local(datetime: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>> {
    datetime
        .and_local_timezone(tz)
        .single()
        .ok_or(Error::InvalidLocalTime {
            datetime,
            timezone: tz,
        })
}
