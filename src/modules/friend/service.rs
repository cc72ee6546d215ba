use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{Decision, FriendResponse},
            rate_limit::{RateLimitPolicy, RateLimiter},
            repository::FriendRepo,
            schema::FriendRequestEntity,
        },
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
    rate_limiter: Arc<RateLimiter<R>>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        let rate_limiter =
            Arc::new(RateLimiter::new(friend_repo.clone(), RateLimitPolicy::default()));
        FriendService { friend_repo, user_repo, rate_limiter }
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if recipient_id == sender_id {
            return Err(error::SystemError::bad_request(
                "Cannot send a friend request to yourself",
            ));
        }

        if self.user_repo.find_by_id(&recipient_id).await?.is_none() {
            return Err(error::SystemError::not_found("Recipient user not found"));
        }

        if self.friend_repo.find_friendship(&sender_id, &recipient_id).await?.is_some() {
            return Err(error::SystemError::conflict("Users are already friends"));
        }

        let now = Utc::now();

        // fast path; the create transaction re-counts under the sender lock
        if !self.rate_limiter.allow(&sender_id, now).await? {
            return Err(error::SystemError::too_many_requests(
                "Too many friend requests sent, please try again later",
            ));
        }

        let policy = self.rate_limiter.policy();
        let request = self
            .friend_repo
            .create_friend_request(
                &sender_id,
                &recipient_id,
                policy.window_start(now),
                policy.max_requests,
            )
            .await?;

        log::info!("friend request {} sent: {} -> {}", request.id, sender_id, recipient_id);

        Ok(request)
    }

    pub async fn respond_to_request(
        &self,
        responder_id: Uuid,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let updated = self
            .friend_repo
            .respond_friend_request_atomic(&request_id, &responder_id, decision)
            .await?;

        log::info!("friend request {} resolved: {:?}", request_id, updated.status);

        Ok(updated)
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        self.friend_repo.find_friends(&user_id).await
    }

    pub async fn get_pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        self.friend_repo.find_pending_requests(&user_id).await
    }
}
