use crate::backend::{BackendResult, ChallengeBackend};
use crate::models::{Achievement, CHALLENGES_COMPLETED};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Awards "challenges completed" achievements after a challenge finishes.
pub struct AchievementEvaluator {
    backend: Arc<dyn ChallengeBackend>,
}

impl AchievementEvaluator {
    pub fn new(backend: Arc<dyn ChallengeBackend>) -> Self {
        Self { backend }
    }

    /// Awards the first listed achievement of `challenge_id` whose threshold
    /// the user now meets and does not yet own. At most one award per call.
    ///
    /// Failures are logged per achievement and never abort the scan.
    pub async fn check_challenge_completion_achievements(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Option<Achievement> {
        let achievements = match self
            .backend
            .list_challenge_achievements(challenge_id, CHALLENGES_COMPLETED)
            .await
        {
            Ok(achievements) => achievements,
            Err(err) => {
                warn!(%user_id, %challenge_id, error = %err, "failed to list challenge achievements");
                return None;
            }
        };

        for achievement in achievements {
            match self.try_award(user_id, &achievement).await {
                Ok(true) => {
                    info!(
                        %user_id,
                        achievement_id = %achievement.id,
                        points = achievement.points,
                        "achievement awarded"
                    );
                    return Some(achievement);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        %user_id,
                        achievement_id = %achievement.id,
                        error = %err,
                        "achievement check failed, skipping"
                    );
                }
            }
        }

        None
    }

    async fn try_award(&self, user_id: Uuid, achievement: &Achievement) -> BackendResult<bool> {
        if self
            .backend
            .has_user_achievement(user_id, achievement.id)
            .await?
        {
            return Ok(false);
        }

        let completed = self.backend.count_completed_challenges(user_id).await?;
        if completed < achievement.rule_value {
            return Ok(false);
        }

        self.backend
            .award_achievement(user_id, achievement.id, achievement.points)
            .await
    }
}
