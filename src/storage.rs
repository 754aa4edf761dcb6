use crate::backend::{BackendResult, ChallengeBackend};
use crate::calendar::{annotate, is_day_accessible, next_available};
use crate::errors::CalendarError;
use crate::models::{
    Achievement, AppData, CalendarDay, CalendarRow, Challenge, ChallengeParticipant, DayStatus,
    NewAchievement, NewChallenge, NextAvailableDay, ParticipantStatus, TrainingDayTemplate,
    UserAchievement, UserPoints,
};
use crate::transition::{apply_exercise_progress, apply_status_change, offset_date};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), CalendarError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    System,
    Fixed(NaiveDate),
}

/// Backend keeping every row in one JSON document.
///
/// Mutations are applied to a copy, written out, and only then swapped in, so
/// a failed write leaves the in-memory rows untouched.
pub struct JsonBackend {
    data_path: Option<PathBuf>,
    data: Mutex<AppData>,
    clock: Clock,
}

impl JsonBackend {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path: Some(data_path),
            data: Mutex::new(data),
            clock: Clock::System,
        }
    }

    pub fn in_memory(data: AppData) -> Self {
        Self {
            data_path: None,
            data: Mutex::new(data),
            clock: Clock::System,
        }
    }

    /// Pins the backend's notion of "today".
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.clock = Clock::Fixed(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        match self.clock {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => date,
        }
    }

    async fn commit(&self, current: &mut AppData, next: AppData) -> BackendResult<()> {
        if let Some(path) = &self.data_path {
            persist_data(path, &next).await?;
        }
        *current = next;
        Ok(())
    }

    fn calendar(&self, data: &AppData, user_id: Uuid, challenge_id: Uuid) -> Vec<CalendarDay> {
        let mut days: Vec<CalendarDay> = data
            .calendar_days
            .iter()
            .filter(|row| row.user_id == user_id && row.challenge_id == challenge_id)
            .map(|row| row.day.clone())
            .collect();
        days.sort_by_key(|day| day.calendar_date);
        annotate(&mut days, self.today());
        days
    }
}

fn ensure_participant(data: &AppData, user_id: Uuid, challenge_id: Uuid) -> BackendResult<()> {
    if data
        .participants
        .iter()
        .any(|p| p.user_id == user_id && p.challenge_id == challenge_id)
    {
        Ok(())
    } else {
        Err(CalendarError::not_found(
            "challenge participant",
            format!("{user_id}/{challenge_id}"),
        ))
    }
}

#[async_trait]
impl ChallengeBackend for JsonBackend {
    async fn get_user_challenge_calendar(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<Vec<CalendarDay>> {
        let data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;
        Ok(self.calendar(&data, user_id, challenge_id))
    }

    async fn generate_user_challenge_calendar(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        start_date: NaiveDate,
    ) -> BackendResult<()> {
        let mut data = self.data.lock().await;
        let challenge = data
            .challenges
            .iter()
            .find(|c| c.id == challenge_id)
            .cloned()
            .ok_or_else(|| CalendarError::not_found("challenge", challenge_id))?;
        if ensure_participant(&data, user_id, challenge_id).is_ok() {
            return Err(CalendarError::precondition(
                "user already joined this challenge",
            ));
        }

        let mut next = data.clone();
        next.participants.push(ChallengeParticipant {
            user_id,
            challenge_id,
            start_date,
            joined_at: Utc::now(),
            completed: false,
            status: ParticipantStatus::Active,
            completed_at: None,
        });
        for template in &challenge.training_days {
            let calendar_date = offset_date(start_date, i64::from(template.day_number) - 1)?;
            next.calendar_days.push(CalendarRow {
                user_id,
                challenge_id,
                day: CalendarDay {
                    id: Uuid::new_v4(),
                    calendar_date,
                    training_day_id: template.id,
                    day_number: template.day_number,
                    title: template.title.clone(),
                    description: template.description.clone(),
                    is_rest_day: template.is_rest_day,
                    status: DayStatus::Pending,
                    is_retry: false,
                    attempt_number: 1,
                    exercises_completed: 0,
                    total_exercises: template.total_exercises,
                    notes: None,
                    completed_at: None,
                    is_today: false,
                    is_past: false,
                    is_accessible: false,
                },
            });
        }
        self.commit(&mut data, next).await?;
        info!(
            %user_id,
            %challenge_id,
            %start_date,
            days = challenge.training_days.len(),
            "calendar generated"
        );
        Ok(())
    }

    async fn handle_challenge_day_status_change(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
        new_status: DayStatus,
        notes: Option<String>,
    ) -> BackendResult<()> {
        let mut data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;

        let mut days = self.calendar(&data, user_id, challenge_id);
        let retry = apply_status_change(&mut days, date, new_status, notes, Utc::now())?;

        let mut next = data.clone();
        if let Some(updated) = days.iter().find(|day| day.calendar_date == date) {
            if let Some(row) = next.calendar_days.iter_mut().find(|row| {
                row.user_id == user_id && row.challenge_id == challenge_id && row.day.id == updated.id
            }) {
                row.day = updated.clone();
            }
        }
        if let Some(day) = retry {
            next.calendar_days.push(CalendarRow {
                user_id,
                challenge_id,
                day,
            });
        }
        self.commit(&mut data, next).await
    }

    async fn record_exercise_progress(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
        exercises_completed: u32,
    ) -> BackendResult<CalendarDay> {
        let mut data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;

        let mut next = data.clone();
        let row = next
            .calendar_days
            .iter_mut()
            .find(|row| {
                row.user_id == user_id
                    && row.challenge_id == challenge_id
                    && row.day.calendar_date == date
            })
            .ok_or_else(|| CalendarError::not_found("calendar day", date))?;
        apply_exercise_progress(&mut row.day, exercises_completed)?;
        self.commit(&mut data, next).await?;

        self.calendar(&data, user_id, challenge_id)
            .into_iter()
            .find(|day| day.calendar_date == date)
            .ok_or_else(|| CalendarError::not_found("calendar day", date))
    }

    async fn can_access_challenge_day(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        date: NaiveDate,
    ) -> BackendResult<bool> {
        let data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;
        let days = self.calendar(&data, user_id, challenge_id);
        Ok(is_day_accessible(&days, date, self.today()))
    }

    async fn get_next_available_challenge_day(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<Option<NextAvailableDay>> {
        let data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;
        Ok(next_available(&self.calendar(&data, user_id, challenge_id)))
    }

    async fn is_challenge_participant_completed(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<bool> {
        let data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;
        Ok(data
            .participants
            .iter()
            .any(|p| p.user_id == user_id && p.challenge_id == challenge_id && p.completed))
    }

    async fn mark_challenge_participant_completed(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> BackendResult<()> {
        let mut data = self.data.lock().await;
        ensure_participant(&data, user_id, challenge_id)?;
        let mut next = data.clone();
        for participant in next
            .participants
            .iter_mut()
            .filter(|p| p.user_id == user_id && p.challenge_id == challenge_id)
        {
            participant.completed = true;
            participant.status = ParticipantStatus::Completed;
            participant.completed_at.get_or_insert_with(Utc::now);
        }
        self.commit(&mut data, next).await
    }

    async fn list_challenge_achievements(
        &self,
        challenge_id: Uuid,
        rule_type: &str,
    ) -> BackendResult<Vec<Achievement>> {
        let data = self.data.lock().await;
        Ok(data
            .achievements
            .iter()
            .filter(|a| a.challenge_id == Some(challenge_id) && a.rule_type == rule_type)
            .cloned()
            .collect())
    }

    async fn has_user_achievement(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
    ) -> BackendResult<bool> {
        let data = self.data.lock().await;
        Ok(data
            .user_achievements
            .iter()
            .any(|ua| ua.user_id == user_id && ua.achievement_id == achievement_id))
    }

    async fn award_achievement(
        &self,
        user_id: Uuid,
        achievement_id: Uuid,
        points: u64,
    ) -> BackendResult<bool> {
        let mut data = self.data.lock().await;
        if !data.achievements.iter().any(|a| a.id == achievement_id) {
            return Err(CalendarError::not_found("achievement", achievement_id));
        }
        if data
            .user_achievements
            .iter()
            .any(|ua| ua.user_id == user_id && ua.achievement_id == achievement_id)
        {
            return Ok(false);
        }

        let mut next = data.clone();
        next.user_achievements.push(UserAchievement {
            user_id,
            achievement_id,
            awarded_at: Utc::now(),
        });
        match next.user_points.iter_mut().find(|p| p.user_id == user_id) {
            Some(entry) => entry.total_points = entry.total_points.saturating_add(points),
            None => next.user_points.push(UserPoints {
                user_id,
                total_points: points,
            }),
        }
        self.commit(&mut data, next).await?;
        Ok(true)
    }

    async fn count_completed_challenges(&self, user_id: Uuid) -> BackendResult<u64> {
        let data = self.data.lock().await;
        Ok(data
            .participants
            .iter()
            .filter(|p| p.user_id == user_id && p.completed)
            .count() as u64)
    }

    async fn create_challenge(&self, challenge: NewChallenge) -> BackendResult<Challenge> {
        let created = Challenge {
            id: Uuid::new_v4(),
            title: challenge.title,
            description: challenge.description,
            training_days: challenge
                .training_days
                .into_iter()
                .enumerate()
                .map(|(index, day)| TrainingDayTemplate {
                    id: Uuid::new_v4(),
                    day_number: index as u32 + 1,
                    title: day.title,
                    description: day.description,
                    is_rest_day: day.is_rest_day,
                    total_exercises: if day.is_rest_day { 0 } else { day.total_exercises },
                })
                .collect(),
        };

        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.challenges.push(created.clone());
        self.commit(&mut data, next).await?;
        info!(challenge_id = %created.id, title = %created.title, "challenge created");
        Ok(created)
    }

    async fn list_challenges(&self) -> BackendResult<Vec<Challenge>> {
        Ok(self.data.lock().await.challenges.clone())
    }

    async fn create_achievement(&self, achievement: NewAchievement) -> BackendResult<Achievement> {
        let mut data = self.data.lock().await;
        if let Some(challenge_id) = achievement.challenge_id {
            if !data.challenges.iter().any(|c| c.id == challenge_id) {
                return Err(CalendarError::not_found("challenge", challenge_id));
            }
        }

        let created = Achievement {
            id: Uuid::new_v4(),
            challenge_id: achievement.challenge_id,
            name: achievement.name,
            description: achievement.description,
            points: achievement.points,
            rule_type: achievement.rule_type,
            rule_value: achievement.rule_value,
        };
        let mut next = data.clone();
        next.achievements.push(created.clone());
        self.commit(&mut data, next).await?;
        info!(achievement_id = %created.id, name = %created.name, "achievement created");
        Ok(created)
    }

    async fn list_user_achievements(&self, user_id: Uuid) -> BackendResult<Vec<Achievement>> {
        let data = self.data.lock().await;
        Ok(data
            .user_achievements
            .iter()
            .filter(|ua| ua.user_id == user_id)
            .filter_map(|ua| data.achievements.iter().find(|a| a.id == ua.achievement_id))
            .cloned()
            .collect())
    }

    async fn user_points(&self, user_id: Uuid) -> BackendResult<u64> {
        let data = self.data.lock().await;
        Ok(data
            .user_points
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.total_points)
            .unwrap_or(0))
    }
}
