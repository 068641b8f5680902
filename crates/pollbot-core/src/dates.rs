//! Weekday arithmetic on calendar dates.
//!
//! Weekdays use `chrono::Weekday` everywhere, so Monday and Friday are
//! numbered identically for poll creation and evaluation.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

/// Weekday the polled event takes place on.
pub const EVENT_WEEKDAY: Weekday = Weekday::Mon;
/// Weekday a pending poll is closed and evaluated on.
pub const EVALUATION_WEEKDAY: Weekday = Weekday::Fri;

/// Returns the date of the next `target` weekday on or after `reference`.
///
/// A `reference` that already falls on `target` is returned unchanged, which
/// allows same-day deadline detection.
pub fn next_occurrence_of_weekday(target: Weekday, reference: NaiveDate) -> NaiveDate {
    let offset = days_between(reference.weekday(), target);
    reference
        .checked_add_days(Days::new(offset))
        .unwrap_or(NaiveDate::MAX)
}

/// Returns the date of the most recent `target` weekday on or before `reference`.
pub fn previous_occurrence_of_weekday(target: Weekday, reference: NaiveDate) -> NaiveDate {
    let offset = days_between(target, reference.weekday());
    reference
        .checked_sub_days(Days::new(offset))
        .unwrap_or(NaiveDate::MIN)
}

/// Day a poll for the event on `polling_date` is closed: the
/// [`EVALUATION_WEEKDAY`] on or before it.
pub fn evaluation_date(polling_date: NaiveDate) -> NaiveDate {
    previous_occurrence_of_weekday(EVALUATION_WEEKDAY, polling_date)
}

/// Event date of a poll created on `today`.
///
/// This is the first [`EVENT_WEEKDAY`] on or after `today` whose
/// [`evaluation_date`] is still ahead, so a fresh poll always stays open for
/// at least one day.
pub fn polling_date_for(today: NaiveDate) -> NaiveDate {
    let upcoming = next_occurrence_of_weekday(EVENT_WEEKDAY, today);
    if evaluation_date(upcoming) > today {
        return upcoming;
    }
    upcoming
        .checked_add_days(Days::new(7))
        .unwrap_or(NaiveDate::MAX)
}

/// Local calendar date of the running process.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// Forward distance in days from `from` to `to`, always in `0..7`.
fn days_between(from: Weekday, to: Weekday) -> u64 {
    let from = u64::from(from.num_days_from_monday());
    let to = u64::from(to.num_days_from_monday());
    (to + 7 - from) % 7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    #[test]
    fn next_occurrence_returns_reference_on_matching_weekday() {
        // 2024-05-06 is a Monday.
        let monday = date(2024, 5, 6);
        assert_eq!(next_occurrence_of_weekday(Weekday::Mon, monday), monday);
    }

    #[test]
    fn next_occurrence_from_wednesday_lands_on_following_monday() {
        let wednesday = date(2024, 5, 8);
        assert_eq!(
            next_occurrence_of_weekday(Weekday::Mon, wednesday),
            date(2024, 5, 13)
        );
    }

    #[test]
    fn next_occurrence_holds_weekday_and_range_for_every_combination() {
        let start = date(2024, 12, 23);
        for day_offset in 0..14 {
            let reference = start + Days::new(day_offset);
            for target in ALL_WEEKDAYS {
                let result = next_occurrence_of_weekday(target, reference);
                assert_eq!(result.weekday(), target);
                assert!(result >= reference);
                assert!((result - reference).num_days() < 7);
                if reference.weekday() == target {
                    assert_eq!(result, reference);
                }
            }
        }
    }

    #[test]
    fn previous_occurrence_holds_weekday_and_range_for_every_combination() {
        let start = date(2024, 2, 26);
        for day_offset in 0..14 {
            let reference = start + Days::new(day_offset);
            for target in ALL_WEEKDAYS {
                let result = previous_occurrence_of_weekday(target, reference);
                assert_eq!(result.weekday(), target);
                assert!(result <= reference);
                assert!((reference - result).num_days() < 7);
            }
        }
    }

    #[test]
    fn evaluation_day_precedes_event_day() {
        let monday = date(2024, 5, 13);
        assert_eq!(
            previous_occurrence_of_weekday(EVALUATION_WEEKDAY, monday),
            date(2024, 5, 10)
        );
        let friday = date(2024, 5, 10);
        assert_eq!(
            previous_occurrence_of_weekday(EVALUATION_WEEKDAY, friday),
            friday
        );
    }

    #[test]
    fn polling_date_from_midweek_is_the_upcoming_event_day() {
        assert_eq!(polling_date_for(date(2024, 5, 8)), date(2024, 5, 13));
        assert_eq!(polling_date_for(date(2024, 5, 9)), date(2024, 5, 13));
    }

    #[test]
    fn polling_date_skips_event_day_whose_evaluation_day_has_arrived() {
        // Friday 2024-05-10 through Monday 2024-05-13 are all at or past the
        // evaluation day of Monday 2024-05-13.
        for day in 10..=13 {
            assert_eq!(polling_date_for(date(2024, 5, day)), date(2024, 5, 20));
        }
    }

    #[test]
    fn polling_date_always_leaves_evaluation_day_ahead() {
        let start = date(2024, 12, 23);
        for day_offset in 0..21 {
            let today = start + Days::new(day_offset);
            let polling_date = polling_date_for(today);
            assert_eq!(polling_date.weekday(), EVENT_WEEKDAY);
            assert_eq!(evaluation_date(polling_date).weekday(), EVALUATION_WEEKDAY);
            assert!(evaluation_date(polling_date) > today, "created on {today}");
            assert!((polling_date - today).num_days() <= 10);
        }
    }
}
