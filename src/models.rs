use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The only achievement rule evaluated on challenge completion.
pub const CHALLENGES_COMPLETED: &str = "challenges_completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Rest,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Pending => "pending",
            DayStatus::Completed => "completed",
            DayStatus::Failed => "failed",
            DayStatus::Rest => "rest",
        }
    }

    pub fn is_resolved(self) -> bool {
        self != DayStatus::Pending
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled slot of a user's challenge timeline.
///
/// `is_today`, `is_past` and `is_accessible` are derived when the calendar is
/// read and are never trusted from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub id: Uuid,
    pub calendar_date: NaiveDate,
    pub training_day_id: Uuid,
    pub day_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_rest_day: bool,
    pub status: DayStatus,
    pub is_retry: bool,
    pub attempt_number: u32,
    pub exercises_completed: u32,
    pub total_exercises: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_today: bool,
    #[serde(default)]
    pub is_past: bool,
    #[serde(default)]
    pub is_accessible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRow {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    #[serde(flatten)]
    pub day: CalendarDay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDayTemplate {
    pub id: Uuid,
    pub day_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_rest_day: bool,
    pub total_exercises: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub training_days: Vec<TrainingDayTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeParticipant {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub start_date: NaiveDate,
    pub joined_at: DateTime<Utc>,
    pub completed: bool,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    #[serde(default)]
    pub challenge_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u64,
    pub rule_type: String,
    pub rule_value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPoints {
    pub user_id: Uuid,
    pub total_points: u64,
}

/// Everything the JSON backend persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub participants: Vec<ChallengeParticipant>,
    #[serde(default)]
    pub calendar_days: Vec<CalendarRow>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub user_achievements: Vec<UserAchievement>,
    #[serde(default)]
    pub user_points: Vec<UserPoints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAvailableDay {
    pub calendar_date: NaiveDate,
    pub day_number: u32,
    pub title: String,
    pub is_retry: bool,
    pub attempt_number: u32,
}

impl From<&CalendarDay> for NextAvailableDay {
    fn from(day: &CalendarDay) -> Self {
        Self {
            calendar_date: day.calendar_date,
            day_number: day.day_number,
            title: day.title.clone(),
            is_retry: day.is_retry,
            attempt_number: day.attempt_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalendarProgress {
    pub total_days: usize,
    pub completed_days: usize,
    pub failed_days: usize,
    pub rest_days: usize,
    pub pending_days: usize,
    pub total_training_days: usize,
    pub completed_training_days: usize,
    pub completion_percent: f64,
    pub retry_attempts: usize,
    pub current_streak: usize,
}

#[derive(Debug, Deserialize)]
pub struct NewTrainingDay {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_rest_day: bool,
    #[serde(default)]
    pub total_exercises: u32,
}

#[derive(Debug, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub training_days: Vec<NewTrainingDay>,
}

#[derive(Debug, Deserialize)]
pub struct NewAchievement {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u64,
    pub rule_type: String,
    pub rule_value: u64,
    #[serde(default)]
    pub challenge_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct JoinRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: DayStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseProgressRequest {
    pub exercises_completed: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub days: Vec<CalendarDay>,
    pub next_available_day: Option<NextAvailableDay>,
    pub progress: CalendarProgress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessResponse {
    pub date: NaiveDate,
    pub accessible: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusChangeResponse {
    pub message: String,
    pub status: DayStatus,
    pub challenge_completed: bool,
    pub achievement: Option<Achievement>,
    pub next_available_day: Option<NextAvailableDay>,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserAchievementsResponse {
    pub total_points: u64,
    pub achievements: Vec<Achievement>,
}
