use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::repository::FriendRequestRepository;

/// Sliding-window admission for request sending, per sender.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: i64,
    pub window_secs: i64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        RateLimitPolicy { max_requests: 3, window_secs: 60 }
    }
}

impl RateLimitPolicy {
    /// Events with `created_at >= window_start(now)` count against the limit.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::seconds(self.window_secs)
    }

    pub fn admits(&self, recent: i64) -> bool {
        recent < self.max_requests
    }
}

/// Counts are derived from the store's request timestamps, so the limiter
/// stays consistent with concurrent writers. This check is the fast path;
/// the store re-counts inside the create transaction.
pub struct RateLimiter<R> {
    repo: Arc<R>,
    policy: RateLimitPolicy,
}

impl<R> RateLimiter<R>
where
    R: FriendRequestRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, policy: RateLimitPolicy) -> Self {
        RateLimiter { repo, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub async fn allow(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, error::SystemError> {
        let recent =
            self.repo.count_recent_requests(user_id, self.policy.window_start(now)).await?;
        Ok(self.policy.admits(recent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_below_limit_only() {
        let policy = RateLimitPolicy::default();
        assert!(policy.admits(0));
        assert!(policy.admits(2));
        assert!(!policy.admits(3));
        assert!(!policy.admits(7));
    }

    #[test]
    fn window_start_trails_now_by_window() {
        let policy = RateLimitPolicy::default();
        let now = Utc::now();
        assert_eq!(now - policy.window_start(now), Duration::seconds(60));
    }
}
