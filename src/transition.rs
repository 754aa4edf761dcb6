use crate::achievements::AchievementEvaluator;
use crate::calendar::CalendarStore;
use crate::errors::CalendarError;
use crate::models::{Achievement, CalendarDay, DayStatus, NextAvailableDay};
use crate::stats::training_day_totals;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub status: DayStatus,
    pub retry_date: Option<NaiveDate>,
    pub challenge_completed: bool,
    pub achievement: Option<Achievement>,
    pub next_available_day: Option<NextAvailableDay>,
    pub message: String,
}

/// Applies `new_status` to the day at `date` inside `days`.
///
/// Returns the retry day appended when a training day fails. Resolved days
/// are terminal, rest days cannot fail and training days cannot be logged as
/// rest.
pub fn apply_status_change(
    days: &mut Vec<CalendarDay>,
    date: NaiveDate,
    new_status: DayStatus,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<Option<CalendarDay>, CalendarError> {
    let day = days
        .iter_mut()
        .find(|day| day.calendar_date == date)
        .ok_or_else(|| CalendarError::not_found("calendar day", date))?;

    if day.status.is_resolved() {
        return Err(CalendarError::precondition(format!(
            "day {date} is already {}",
            day.status
        )));
    }
    match new_status {
        DayStatus::Pending => {
            return Err(CalendarError::precondition("a day cannot be reset to pending"));
        }
        DayStatus::Failed if day.is_rest_day => {
            return Err(CalendarError::precondition("rest days cannot be failed"));
        }
        DayStatus::Rest if !day.is_rest_day => {
            return Err(CalendarError::precondition(
                "only rest days can be logged as rest",
            ));
        }
        _ => {}
    }

    day.status = new_status;
    if notes.is_some() {
        day.notes = notes;
    }
    if new_status == DayStatus::Completed {
        day.exercises_completed = day.total_exercises;
        day.completed_at = Some(now);
    }
    day.exercises_completed = day.exercises_completed.min(day.total_exercises);

    if new_status != DayStatus::Failed {
        return Ok(None);
    }

    let failed = day.clone();
    let retry_date = next_free_date(days, date)?;
    let retry = CalendarDay {
        id: Uuid::new_v4(),
        calendar_date: retry_date,
        training_day_id: failed.training_day_id,
        day_number: failed.day_number,
        title: failed.title,
        description: failed.description,
        is_rest_day: false,
        status: DayStatus::Pending,
        is_retry: true,
        attempt_number: failed.attempt_number + 1,
        exercises_completed: 0,
        total_exercises: failed.total_exercises,
        notes: None,
        completed_at: None,
        is_today: false,
        is_past: false,
        is_accessible: false,
    };
    days.push(retry.clone());
    days.sort_by_key(|day| day.calendar_date);
    Ok(Some(retry))
}

/// Sets the exercise counter of a pending training day, clamped to its total.
pub fn apply_exercise_progress(
    day: &mut CalendarDay,
    exercises_completed: u32,
) -> Result<(), CalendarError> {
    if day.is_rest_day {
        return Err(CalendarError::precondition("rest days have no exercises"));
    }
    if day.status.is_resolved() {
        return Err(CalendarError::precondition(format!(
            "day {} is already {}",
            day.calendar_date, day.status
        )));
    }
    day.exercises_completed = exercises_completed.min(day.total_exercises);
    Ok(())
}

/// Whether completing `in_flight` finishes the challenge, judged on the
/// snapshot taken before the completion is persisted.
pub fn completion_reached(days_before: &[CalendarDay], in_flight: &CalendarDay) -> bool {
    if in_flight.is_rest_day {
        return false;
    }
    let (completed, total) = training_day_totals(days_before);
    completed + 1 >= total
}

/// `date` moved by `days`, or `PreconditionFailed` past the representable range.
pub fn offset_date(date: NaiveDate, days: i64) -> Result<NaiveDate, CalendarError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or_else(|| CalendarError::precondition("calendar date out of range"))
}

/// First date after `after` that holds no calendar day.
fn next_free_date(days: &[CalendarDay], after: NaiveDate) -> Result<NaiveDate, CalendarError> {
    let mut candidate = offset_date(after, 1)?;
    while days.iter().any(|day| day.calendar_date == candidate) {
        candidate = offset_date(candidate, 1)?;
    }
    Ok(candidate)
}

/// Changes the status of the day at `date`, then reloads `store`.
///
/// The store must hold a loaded snapshot. On completion of the last training
/// slot the participant is marked completed and achievements are evaluated.
pub async fn change_day_status(
    store: &mut CalendarStore,
    date: NaiveDate,
    new_status: DayStatus,
    notes: Option<String>,
) -> Result<TransitionOutcome, CalendarError> {
    let backend = store.backend().clone();
    let user_id = store.user_id();
    let challenge_id = store.challenge_id();

    let day = store
        .by_date(date)
        .cloned()
        .ok_or_else(|| CalendarError::not_found("calendar day", date))?;
    if day.status.is_resolved() {
        return Err(CalendarError::precondition(format!(
            "day {date} is already {}",
            day.status
        )));
    }
    if !backend
        .can_access_challenge_day(user_id, challenge_id, date)
        .await?
    {
        return Err(CalendarError::precondition(format!(
            "day {date} is not accessible yet"
        )));
    }

    let completes_challenge =
        new_status == DayStatus::Completed && completion_reached(store.days(), &day);

    backend
        .handle_challenge_day_status_change(user_id, challenge_id, date, new_status, notes)
        .await?;
    info!(%user_id, %challenge_id, %date, status = %new_status, "day status changed");

    store.load().await?;
    let next_available_day = backend
        .get_next_available_challenge_day(user_id, challenge_id)
        .await?;

    let retry_date = if new_status == DayStatus::Failed {
        store
            .pending()
            .into_iter()
            .find(|retry| {
                retry.is_retry
                    && retry.day_number == day.day_number
                    && retry.attempt_number == day.attempt_number + 1
            })
            .map(|retry| retry.calendar_date)
    } else {
        None
    };

    let mut achievement = None;
    if completes_challenge {
        backend
            .mark_challenge_participant_completed(user_id, challenge_id)
            .await?;
        info!(%user_id, %challenge_id, "challenge completed");
        achievement = AchievementEvaluator::new(backend.clone())
            .check_challenge_completion_achievements(user_id, challenge_id)
            .await;
    }

    let message = notification(
        &day,
        new_status,
        retry_date,
        completes_challenge,
        achievement.as_ref(),
    );

    Ok(TransitionOutcome {
        status: new_status,
        retry_date,
        challenge_completed: completes_challenge,
        achievement,
        next_available_day,
        message,
    })
}

/// Records a completion that the status change itself failed to record.
///
/// Runs on the loaded snapshot: when every training slot is completed but the
/// participant is still active, the participant is marked completed and
/// achievements are evaluated. Returns whether anything was recorded.
pub async fn reconcile_completion(store: &CalendarStore) -> Result<bool, CalendarError> {
    let (completed, total) = training_day_totals(store.days());
    if total == 0 || completed < total {
        return Ok(false);
    }

    let backend = store.backend().clone();
    let user_id = store.user_id();
    let challenge_id = store.challenge_id();
    if backend
        .is_challenge_participant_completed(user_id, challenge_id)
        .await?
    {
        return Ok(false);
    }

    backend
        .mark_challenge_participant_completed(user_id, challenge_id)
        .await?;
    info!(%user_id, %challenge_id, "recorded missed challenge completion");
    AchievementEvaluator::new(backend)
        .check_challenge_completion_achievements(user_id, challenge_id)
        .await;
    Ok(true)
}

pub async fn record_exercise_progress(
    store: &mut CalendarStore,
    date: NaiveDate,
    exercises_completed: u32,
) -> Result<CalendarDay, CalendarError> {
    let day = store
        .backend()
        .record_exercise_progress(store.user_id(), store.challenge_id(), date, exercises_completed)
        .await?;
    store.load().await?;
    Ok(day)
}

fn notification(
    day: &CalendarDay,
    status: DayStatus,
    retry_date: Option<NaiveDate>,
    challenge_completed: bool,
    achievement: Option<&Achievement>,
) -> String {
    let mut message = match (status, retry_date) {
        (DayStatus::Failed, Some(retry)) => {
            format!("Day {} failed, retry scheduled for {retry}", day.day_number)
        }
        (DayStatus::Rest, _) => format!("Day {} logged as rest", day.day_number),
        _ => format!("Day {} marked {status}", day.day_number),
    };
    if challenge_completed {
        message.push_str(". Challenge completed!");
    }
    if let Some(achievement) = achievement {
        message.push_str(&format!(" Achievement unlocked: {}", achievement.name));
    }
    message
}
