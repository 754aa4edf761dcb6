use crate::errors::AppError;
use crate::models::{
    AccessResponse, Achievement, CalendarDay, CalendarResponse, Challenge,
    ExerciseProgressRequest, JoinRequest, NewAchievement, NewChallenge, StatusChangeRequest,
    StatusChangeResponse, UserAchievementsResponse, CHALLENGES_COMPLETED,
};
use crate::state::AppState;
use crate::transition;
use crate::ui::{render_calendar, render_index};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::{Local, NaiveDate};
use tracing::info;
use uuid::Uuid;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let challenges = state.backend.list_challenges().await?;
    Ok(Html(render_index(&challenges)))
}

pub async fn calendar_page(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(Uuid, Uuid)>,
) -> Result<Html<String>, AppError> {
    let mut store = state.calendar_store(user_id, challenge_id);
    store.load().await?;
    Ok(Html(render_calendar(
        store.days(),
        &store.progress(),
        store.next_available_day().as_ref(),
    )))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    Json(payload): Json<NewChallenge>,
) -> Result<(StatusCode, Json<Challenge>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if payload.training_days.is_empty() {
        return Err(AppError::bad_request("a challenge needs at least one day"));
    }
    let challenge = state.backend.create_challenge(payload).await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

pub async fn list_challenges(State(state): State<AppState>) -> Result<Json<Vec<Challenge>>, AppError> {
    Ok(Json(state.backend.list_challenges().await?))
}

pub async fn create_achievement(
    State(state): State<AppState>,
    Json(payload): Json<NewAchievement>,
) -> Result<(StatusCode, Json<Achievement>), AppError> {
    validate_new_achievement(&payload)?;
    let achievement = state.backend.create_achievement(payload).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

pub async fn list_challenge_achievements(
    State(state): State<AppState>,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<Vec<Achievement>>, AppError> {
    let achievements = state
        .backend
        .list_challenge_achievements(challenge_id, CHALLENGES_COMPLETED)
        .await?;
    Ok(Json(achievements))
}

pub async fn join_challenge(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<(StatusCode, Json<CalendarResponse>), AppError> {
    let payload = parse_join_request(&body)?;
    let start_date = payload
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());
    state
        .backend
        .generate_user_challenge_calendar(user_id, challenge_id, start_date)
        .await?;
    info!(%user_id, %challenge_id, %start_date, "user joined challenge");

    let response = load_calendar(&state, user_id, challenge_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Path((user_id, challenge_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CalendarResponse>, AppError> {
    Ok(Json(load_calendar(&state, user_id, challenge_id).await?))
}

pub async fn get_day_access(
    State(state): State<AppState>,
    Path((user_id, challenge_id, date)): Path<(Uuid, Uuid, NaiveDate)>,
) -> Result<Json<AccessResponse>, AppError> {
    let accessible = state
        .backend
        .can_access_challenge_day(user_id, challenge_id, date)
        .await?;
    Ok(Json(AccessResponse { date, accessible }))
}

pub async fn change_day_status(
    State(state): State<AppState>,
    Path((user_id, challenge_id, date)): Path<(Uuid, Uuid, NaiveDate)>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<StatusChangeResponse>, AppError> {
    let mut store = state.calendar_store(user_id, challenge_id);
    store.load().await?;
    let outcome =
        transition::change_day_status(&mut store, date, payload.status, payload.notes).await?;

    Ok(Json(StatusChangeResponse {
        message: outcome.message,
        status: outcome.status,
        challenge_completed: outcome.challenge_completed,
        achievement: outcome.achievement,
        next_available_day: outcome.next_available_day,
        days: store.days().to_vec(),
    }))
}

pub async fn record_exercises(
    State(state): State<AppState>,
    Path((user_id, challenge_id, date)): Path<(Uuid, Uuid, NaiveDate)>,
    Json(payload): Json<ExerciseProgressRequest>,
) -> Result<Json<CalendarDay>, AppError> {
    let mut store = state.calendar_store(user_id, challenge_id);
    let day =
        transition::record_exercise_progress(&mut store, date, payload.exercises_completed).await?;
    Ok(Json(day))
}

pub async fn get_user_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserAchievementsResponse>, AppError> {
    let achievements = state.backend.list_user_achievements(user_id).await?;
    let total_points = state.backend.user_points(user_id).await?;
    Ok(Json(UserAchievementsResponse {
        total_points,
        achievements,
    }))
}

/// Only "challenges completed" rules are ever evaluated, so no other rule
/// type is accepted.
fn validate_new_achievement(payload: &NewAchievement) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.rule_type != CHALLENGES_COMPLETED {
        return Err(AppError::bad_request(format!(
            "rule_type must be '{CHALLENGES_COMPLETED}'"
        )));
    }
    Ok(())
}

/// An empty body joins starting today.
fn parse_join_request(body: &[u8]) -> Result<JoinRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JoinRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("invalid join request: {err}")))
}

async fn load_calendar(
    state: &AppState,
    user_id: Uuid,
    challenge_id: Uuid,
) -> Result<CalendarResponse, AppError> {
    let mut store = state.calendar_store(user_id, challenge_id);
    store.load().await?;
    transition::reconcile_completion(&store).await?;
    let next_available_day = state
        .backend
        .get_next_available_challenge_day(user_id, challenge_id)
        .await?;
    Ok(CalendarResponse {
        days: store.days().to_vec(),
        next_available_day,
        progress: store.progress(),
    })
}
