use crate::backend::{BackendResult, ChallengeBackend};
use crate::models::{CalendarDay, CalendarProgress, DayStatus, NextAvailableDay};
use crate::stats::build_progress;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// In-memory snapshot of one user's calendar for one challenge.
///
/// The snapshot is only ever replaced wholesale by [`CalendarStore::load`];
/// callers reload after every mutation instead of patching it.
pub struct CalendarStore {
    backend: Arc<dyn ChallengeBackend>,
    user_id: Uuid,
    challenge_id: Uuid,
    days: Vec<CalendarDay>,
}

impl CalendarStore {
    pub fn new(backend: Arc<dyn ChallengeBackend>, user_id: Uuid, challenge_id: Uuid) -> Self {
        Self {
            backend,
            user_id,
            challenge_id,
            days: Vec::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ChallengeBackend> {
        &self.backend
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn challenge_id(&self) -> Uuid {
        self.challenge_id
    }

    pub async fn load(&mut self) -> BackendResult<&[CalendarDay]> {
        let mut days = self
            .backend
            .get_user_challenge_calendar(self.user_id, self.challenge_id)
            .await?;
        days.sort_by_key(|day| day.calendar_date);
        debug!(
            user_id = %self.user_id,
            challenge_id = %self.challenge_id,
            days = days.len(),
            "calendar loaded"
        );
        self.days = days;
        Ok(self.days.as_slice())
    }

    pub fn days(&self) -> &[CalendarDay] {
        &self.days
    }

    pub fn by_date(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|day| day.calendar_date == date)
    }

    pub fn by_id(&self, id: Uuid) -> Option<&CalendarDay> {
        self.days.iter().find(|day| day.id == id)
    }

    pub fn completed(&self) -> Vec<&CalendarDay> {
        self.with_status(DayStatus::Completed)
    }

    pub fn failed(&self) -> Vec<&CalendarDay> {
        self.with_status(DayStatus::Failed)
    }

    pub fn rest(&self) -> Vec<&CalendarDay> {
        self.with_status(DayStatus::Rest)
    }

    pub fn pending(&self) -> Vec<&CalendarDay> {
        self.with_status(DayStatus::Pending)
    }

    pub fn today(&self) -> Option<&CalendarDay> {
        self.days.iter().find(|day| day.is_today)
    }

    pub fn next_available_day(&self) -> Option<NextAvailableDay> {
        next_available(&self.days)
    }

    pub fn progress(&self) -> CalendarProgress {
        build_progress(&self.days)
    }

    fn with_status(&self, status: DayStatus) -> Vec<&CalendarDay> {
        self.days.iter().filter(|day| day.status == status).collect()
    }
}

/// A day can be acted on once its date has arrived and every earlier
/// training day has been resolved.
pub fn is_day_accessible(days: &[CalendarDay], date: NaiveDate, today: NaiveDate) -> bool {
    if date > today || !days.iter().any(|day| day.calendar_date == date) {
        return false;
    }
    days.iter()
        .filter(|day| day.calendar_date < date && !day.is_rest_day)
        .all(|day| day.status.is_resolved())
}

/// Fills the derived flags of every day for `today`.
pub fn annotate(days: &mut [CalendarDay], today: NaiveDate) {
    let snapshot: Vec<CalendarDay> = days.to_vec();
    for day in days.iter_mut() {
        day.is_today = day.calendar_date == today;
        day.is_past = day.calendar_date < today;
        day.is_accessible = is_day_accessible(&snapshot, day.calendar_date, today);
    }
}

/// Earliest pending day in date order.
pub fn next_available(days: &[CalendarDay]) -> Option<NextAvailableDay> {
    days.iter()
        .filter(|day| day.status == DayStatus::Pending)
        .min_by_key(|day| day.calendar_date)
        .map(NextAvailableDay::from)
}
