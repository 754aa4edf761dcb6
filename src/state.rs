use crate::backend::ChallengeBackend;
use crate::calendar::CalendarStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChallengeBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn ChallengeBackend>) -> Self {
        Self { backend }
    }

    /// Fresh, unloaded store for one request.
    pub fn calendar_store(&self, user_id: Uuid, challenge_id: Uuid) -> CalendarStore {
        CalendarStore::new(Arc::clone(&self.backend), user_id, challenge_id)
    }
}
