pub mod achievements;
pub mod app;
pub mod backend;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod transition;
pub mod ui;

pub use achievements::AchievementEvaluator;
pub use app::router;
pub use backend::ChallengeBackend;
pub use calendar::CalendarStore;
pub use config::Config;
pub use errors::{AppError, CalendarError};
pub use state::AppState;
pub use storage::{load_data, JsonBackend};
pub use transition::change_day_status;
