use crate::models::{CalendarDay, CalendarProgress, DayStatus};
use std::collections::BTreeSet;

/// `(completed, total)` training slots of a calendar.
///
/// A retry shares its `day_number` with the failed attempt, so slots are
/// counted per day number: a slot is completed once any attempt of it is.
pub fn training_day_totals(days: &[CalendarDay]) -> (usize, usize) {
    let mut total = BTreeSet::new();
    let mut completed = BTreeSet::new();
    for day in days.iter().filter(|day| !day.is_rest_day) {
        total.insert(day.day_number);
        if day.status == DayStatus::Completed {
            completed.insert(day.day_number);
        }
    }
    (completed.len(), total.len())
}

pub fn build_progress(days: &[CalendarDay]) -> CalendarProgress {
    let count = |status: DayStatus| days.iter().filter(|day| day.status == status).count();
    let (completed_training_days, total_training_days) = training_day_totals(days);

    let completion_percent = if total_training_days == 0 {
        0.0
    } else {
        completed_training_days as f64 * 100.0 / total_training_days as f64
    };

    let mut resolved: Vec<&CalendarDay> = days
        .iter()
        .filter(|day| !day.is_rest_day && day.status.is_resolved())
        .collect();
    resolved.sort_by(|a, b| b.calendar_date.cmp(&a.calendar_date));
    let current_streak = resolved
        .iter()
        .take_while(|day| day.status == DayStatus::Completed)
        .count();

    CalendarProgress {
        total_days: days.len(),
        completed_days: count(DayStatus::Completed),
        failed_days: count(DayStatus::Failed),
        rest_days: count(DayStatus::Rest),
        pending_days: count(DayStatus::Pending),
        total_training_days,
        completed_training_days,
        completion_percent,
        retry_attempts: days.iter().filter(|day| day.is_retry).count(),
        current_streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::fixtures::{day, week};
    use chrono::NaiveDate;

    #[test]
    fn progress_counts_each_status() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut days = week(start);
        days[0].status = DayStatus::Completed;
        days[1].status = DayStatus::Completed;
        days[2].status = DayStatus::Failed;
        days[6].status = DayStatus::Rest;

        let progress = build_progress(&days);
        assert_eq!(progress.total_days, 7);
        assert_eq!(progress.completed_days, 2);
        assert_eq!(progress.failed_days, 1);
        assert_eq!(progress.rest_days, 1);
        assert_eq!(progress.pending_days, 3);
        assert_eq!(progress.total_training_days, 6);
        assert_eq!(progress.completed_training_days, 2);
        assert_eq!(progress.current_streak, 0);
    }

    #[test]
    fn retry_counts_as_the_same_training_slot() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut days = week(start);
        for day in days.iter_mut().take(5) {
            day.status = DayStatus::Completed;
        }
        days[5].status = DayStatus::Failed;
        let mut retry = day(start, 8, false);
        retry.day_number = 6;
        retry.is_retry = true;
        retry.attempt_number = 2;
        retry.status = DayStatus::Completed;
        days.push(retry);

        assert_eq!(training_day_totals(&days), (6, 6));
        let progress = build_progress(&days);
        assert_eq!(progress.retry_attempts, 1);
        assert_eq!(progress.current_streak, 1);
        assert!((progress.completion_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_calendar_has_zero_progress() {
        let progress = build_progress(&[]);
        assert_eq!(progress, CalendarProgress::default());
    }
}
