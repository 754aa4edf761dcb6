use crate::errors::CalendarError;
use crate::models::{
    Achievement, CalendarDay, Challenge, DayStatus, NewAchievement, NewChallenge, NextAvailableDay,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

pub type BackendResult<T> = Result<T, CalendarError>;

/// Data and procedure service the calendar logic is a client of.
///
/// Every call is one round-trip; nothing here is retried by callers.
#[async_trait]
pub trait ChallengeBackend: Send + Sync {
    /// Days of one (user, challenge) calendar in date order, with the derived
    /// flags filled in for the backend's current day.
    async fn get_user_challenge_calendar(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<Vec<CalendarDay>>;

    async fn generate_user_challenge_calendar(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        start_date: NaiveDate,
    ) -> BackendResult<()>;

    /// Applies a status to the day at `date` and inserts a retry day when the
    /// new status is `failed`.
    async fn handle_challenge_day_status_change(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
        new_status: DayStatus,
        notes: Option<String>,
    ) -> BackendResult<()>;

    async fn record_exercise_progress(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
        exercises_completed: u32,
    ) -> BackendResult<CalendarDay>;

    async fn can_access_challenge_day(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
    ) -> BackendResult<bool>;

    async fn get_next_available_challenge_day(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<Option<NextAvailableDay>>;

    async fn is_challenge_participant_completed(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<bool>;

    async fn mark_challenge_participant_completed(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<()>;

    async fn list_challenge_achievements(
        &self,
        challenge_id: Uuid,
        rule_type: &str,
    ) -> BackendResult<Vec<Achievement>>;

    async fn has_user_achievement(&self, user_id: Uuid, achievement_id: Uuid)
    -> BackendResult<bool>;

    /// Inserts the (user, achievement) pair and adds `points` to the user's
    /// total. Returns `false` and changes nothing when the pair already exists.
    async fn award_achievement(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        points: u64,
    ) -> BackendResult<bool>;

    async fn count_completed_challenges(&self, user_id: Uuid) -> BackendResult<u64>;

    async fn create_challenge(&self, challenge: NewChallenge) -> BackendResult<Challenge>;

    async fn list_challenges(&self) -> BackendResult<Vec<Challenge>>;

    async fn create_achievement(&self, achievement: NewAchievement) -> BackendResult<Achievement>;

    async fn list_user_achievements(&self, user_id: Uuid) -> BackendResult<Vec<Achievement>>;

    async fn user_points(&self, user_id: Uuid) -> BackendResult<u64>;
}
