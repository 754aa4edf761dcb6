use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/users/:user_id/challenges/:challenge_id", get(handlers::calendar_page))
        .route(
            "/api/challenges",
            get(handlers::list_challenges).post(handlers::create_challenge),
        )
        .route("/api/achievements", post(handlers::create_achievement))
        .route(
            "/api/challenges/:challenge_id/achievements",
            get(handlers::list_challenge_achievements),
        )
        .route(
            "/api/users/:user_id/challenges/:challenge_id/join",
            post(handlers::join_challenge),
        )
        .route(
            "/api/users/:user_id/challenges/:challenge_id/calendar",
            get(handlers::get_calendar),
        )
        .route(
            "/api/users/:user_id/challenges/:challenge_id/days/:date/access",
            get(handlers::get_day_access),
        )
        .route(
            "/api/users/:user_id/challenges/:challenge_id/days/:date/status",
            post(handlers::change_day_status),
        )
        .route(
            "/api/users/:user_id/challenges/:challenge_id/days/:date/exercises",
            post(handlers::record_exercises),
        )
        .route("/api/users/:user_id/achievements", get(handlers::get_user_achievements))
        .with_state(state)
}
