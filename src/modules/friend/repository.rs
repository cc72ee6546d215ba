use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::{Decision, FriendResponse};
use crate::modules::friend::schema::{FriendRequestEntity, FriendshipEntity};

#[async_trait::async_trait]
pub trait FriendshipRepository {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    async fn find_friends(&self, user_id: &Uuid)
    -> Result<Vec<FriendResponse>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// Incoming requests still awaiting a response, oldest first.
    async fn find_pending_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError>;

    /// Requests sent by `sender` with `created_at >= since`, any status.
    async fn count_recent_requests(
        &self,
        sender_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, error::SystemError>;

    /// Atomic admission: re-counts the rate window and checks the ordered
    /// (sender, recipient) pair inside one transaction. Errors with
    /// `TooManyRequests` when the window is full and `Conflict` when the
    /// pair already holds a request of any status.
    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        window_start: DateTime<Utc>,
        max_in_window: i64,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendshipRepository + FriendRequestRepository + Send + Sync {
    /// One transaction: load the request addressed to `responder` under a
    /// row lock, require it to still be pending, transition it, and on
    /// accept create the friendship for the canonical pair.
    async fn respond_friend_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        decision: Decision,
    ) -> Result<FriendRequestEntity, error::SystemError>;
}
