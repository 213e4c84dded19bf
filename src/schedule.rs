//! Schedule reconciliation.
//!
//! The schedule endpoint is fetched once per requested stage and each fetch
//! returns its own view of the affected days, so the same calendar date
//! shows up once per stage. Reconciliation merges those views into one
//! canonical [`Schedule`]: group by date, collapse windows reported under
//! several stages (keeping the highest stage), and sort.
//!
//! The output is a pure function of the observations: grouping uses an
//! ordered map and deduplication an explicit linear scan, so the final sort
//! order is the only thing that determines output order.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::model::{Schedule, ScheduleDay, Stage, TimeSlot};
use crate::parse;

/// One raw (stage, day-token, duration-text) fragment scraped from a single
/// stage's schedule markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageObservation {
    pub stage: Stage,
    pub day_token: String,
    pub duration_text: String,
}

/// Merge per-stage observations into a normalized schedule.
///
/// Any parse failure aborts the whole reconciliation, wrapped with the
/// stage and day token that triggered it; a partial schedule is never
/// returned.
pub(crate) fn reconcile(
    year: i32,
    tz: Tz,
    observations: &[StageObservation],
) -> Result<Schedule> {
    let mut slots_by_date: BTreeMap<NaiveDate, Vec<TimeSlot>> = BTreeMap::new();

    for observation in observations {
        let day = parse::parse_schedule_day(
            year,
            &observation.day_token,
            &observation.duration_text,
            tz,
            observation.stage,
        )
        .map_err(|source| Error::Schedule {
            stage: observation.stage,
            token: observation.day_token.clone(),
            source: Box::new(source),
        })?;

        slots_by_date
            .entry(day.date.date_naive())
            .or_default()
            .extend(day.slots);
    }

    let mut days = Vec::with_capacity(slots_by_date.len());

    for (date, slots) in slots_by_date {
        let mut merged: Vec<TimeSlot> = Vec::new();

        for slot in slots {
            match merged
                .iter_mut()
                .find(|s| s.start == slot.start && s.duration == slot.duration)
            {
                // Same window under several stages: keep the highest stage.
                // Equal stages keep the first-seen slot.
                Some(existing) => {
                    if existing.stage < slot.stage {
                        *existing = slot;
                    }
                }
                None => merged.push(slot),
            }
        }

        merged.sort_by_key(|slot| (slot.start, slot.duration));

        days.push(ScheduleDay {
            date: date
                .and_time(NaiveTime::MIN)
                .and_local_timezone(tz)
                .single()
                .ok_or(Error::InvalidLocalTime {
                    datetime: date.and_time(NaiveTime::MIN),
                    timezone: tz,
                })?,
            slots: merged,
        });
    }

    Ok(Schedule { days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Africa::Johannesburg;

    fn observation(stage: Stage, day_token: &str, duration_text: &str) -> StageObservation {
        StageObservation {
            stage,
            day_token: day_token.to_string(),
            duration_text: duration_text.to_string(),
        }
    }

    #[test]
    fn test_single_observation() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30")],
        )
        .unwrap();

        assert_eq!(schedule.days.len(), 1);

        let day = &schedule.days[0];
        assert_eq!(
            day.date,
            Johannesburg.with_ymd_and_hms(2020, 9, 7, 0, 0, 0).unwrap()
        );
        assert_eq!(day.slots.len(), 1);
        assert_eq!(day.slots[0].duration, Duration::minutes(150));
        assert_eq!(day.slots[0].stage, Stage::Stage1);
    }

    #[test]
    fn test_same_date_across_stages_is_merged() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30"),
                observation(Stage::Stage2, "Mon, 07 Sep", "08:00 - 10:30"),
            ],
        )
        .unwrap();

        assert_eq!(schedule.days.len(), 1);
        assert_eq!(schedule.days[0].slots.len(), 2);
        assert_eq!(schedule.days[0].slots[0].stage, Stage::Stage1);
        assert_eq!(schedule.days[0].slots[1].stage, Stage::Stage2);
    }

    #[test]
    fn test_duplicate_window_keeps_highest_stage() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30"),
                observation(Stage::Stage3, "Mon, 07 Sep", "00:00 - 02:30"),
            ],
        )
        .unwrap();

        assert_eq!(schedule.days.len(), 1);
        assert_eq!(schedule.days[0].slots.len(), 1);
        assert_eq!(schedule.days[0].slots[0].stage, Stage::Stage3);
    }

    #[test]
    fn test_duplicate_window_higher_stage_first() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage3, "Mon, 07 Sep", "00:00 - 02:30"),
                observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30"),
            ],
        )
        .unwrap();

        assert_eq!(schedule.days[0].slots.len(), 1);
        assert_eq!(schedule.days[0].slots[0].stage, Stage::Stage3);
    }

    #[test]
    fn test_slots_sorted_within_day() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage1, "Mon, 07 Sep", "20:00 - 00:30"),
                observation(Stage::Stage2, "Mon, 07 Sep", "04:00 - 08:30"),
            ],
        )
        .unwrap();

        let starts: Vec<_> = schedule.days[0].slots.iter().map(|s| s.start).collect();
        assert_eq!(
            starts,
            vec![
                Johannesburg.with_ymd_and_hms(2020, 9, 7, 4, 0, 0).unwrap(),
                Johannesburg.with_ymd_and_hms(2020, 9, 7, 20, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_days_sorted_ascending() {
        let schedule = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage1, "Wed, 09 Sep", "04:00 - 08:30"),
                observation(Stage::Stage1, "Mon, 07 Sep", "04:00 - 08:30"),
                observation(Stage::Stage1, "Tue, 08 Sep", "04:00 - 08:30"),
            ],
        )
        .unwrap();

        let dates: Vec<_> = schedule.days.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                Johannesburg.with_ymd_and_hms(2020, 9, 7, 0, 0, 0).unwrap(),
                Johannesburg.with_ymd_and_hms(2020, 9, 8, 0, 0, 0).unwrap(),
                Johannesburg.with_ymd_and_hms(2020, 9, 9, 0, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_reconcile_is_order_independent() {
        let observations = vec![
            observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30"),
            observation(Stage::Stage1, "Tue, 08 Sep", "04:00 - 08:30"),
            observation(Stage::Stage2, "Mon, 07 Sep", "00:00 - 02:30"),
            observation(Stage::Stage2, "Tue, 08 Sep", "12:00 - 14:30"),
            observation(Stage::Stage3, "Wed, 09 Sep", "20:00 - 00:30"),
        ];

        let reference = reconcile(2020, Johannesburg, &observations).unwrap();

        // Rotate through several permutations of fetch order; the result
        // must not depend on it.
        let mut permuted = observations.clone();
        for _ in 0..observations.len() {
            permuted.rotate_left(1);
            assert_eq!(reconcile(2020, Johannesburg, &permuted).unwrap(), reference);
        }

        let mut reversed = observations;
        reversed.reverse();
        assert_eq!(reconcile(2020, Johannesburg, &reversed).unwrap(), reference);
    }

    #[test]
    fn test_parse_failure_aborts_with_context() {
        let err = reconcile(
            2020,
            Johannesburg,
            &[
                observation(Stage::Stage1, "Mon, 07 Sep", "00:00 - 02:30"),
                observation(Stage::Stage4, "Notaday", "00:00 - 02:30"),
            ],
        )
        .unwrap_err();

        match err {
            Error::Schedule { stage, token, source } => {
                assert_eq!(stage, Stage::Stage4);
                assert_eq!(token, "Notaday");
                assert!(matches!(*source, Error::DateParse { .. }));
            }
            other => panic!("expected Schedule wrapper, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_observations_yield_empty_schedule() {
        let schedule = reconcile(2020, Johannesburg, &[]).unwrap();
        assert!(schedule.days.is_empty());
    }
}
