//! In-memory stand-in for the Postgres friend repository. All state lives
//! behind one mutex, which gives the same atomicity the real store gets
//! from its transactions.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{Decision, FriendResponse},
            repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
            schema::{FriendRequestEntity, FriendshipEntity, RequestStatus, ordered_pair},
        },
        user::repository_mem::UserRepositoryMem,
    },
};

#[derive(Default)]
struct State {
    requests: Vec<FriendRequestEntity>,
    friendships: Vec<FriendshipEntity>,
}

pub struct FriendRepositoryMem {
    users: Arc<UserRepositoryMem>,
    state: Mutex<State>,
}

impl FriendRepositoryMem {
    pub fn new(users: Arc<UserRepositoryMem>) -> Self {
        Self { users, state: Mutex::new(State::default()) }
    }

    /// Rewind a request's `created_at`, for window-roll tests.
    pub fn backdate_request(&self, request_id: &Uuid, secs: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(request) = state.requests.iter_mut().find(|r| r.id == *request_id) {
            request.created_at -= Duration::seconds(secs);
        }
    }

    pub fn friendship_count(&self) -> usize {
        self.state.lock().unwrap().friendships.len()
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryMem {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let (user_a, user_b) = ordered_pair(*user_id_a, *user_id_b);
        let state = self.state.lock().unwrap();
        Ok(state
            .friendships
            .iter()
            .find(|f| f.user_a == user_a && f.user_b == user_b)
            .cloned())
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let others: Vec<Uuid> = {
            let state = self.state.lock().unwrap();
            state
                .friendships
                .iter()
                .filter_map(|f| {
                    if f.user_a == *user_id {
                        Some(f.user_b)
                    } else if f.user_b == *user_id {
                        Some(f.user_a)
                    } else {
                        None
                    }
                })
                .collect()
        };

        Ok(others
            .into_iter()
            .filter_map(|id| self.users.find_sync(&id))
            .map(FriendResponse::from)
            .collect())
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryMem {
    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state.requests.iter().find(|r| r.id == *request_id).cloned())
    }

    async fn find_pending_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let state = self.state.lock().unwrap();
        let mut pending: Vec<FriendRequestEntity> = state
            .requests
            .iter()
            .filter(|r| r.to_user_id == *user_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn count_recent_requests(
        &self,
        sender_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, error::SystemError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .requests
            .iter()
            .filter(|r| r.from_user_id == *sender_id && r.created_at >= since)
            .count() as i64)
    }

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        window_start: DateTime<Utc>,
        max_in_window: i64,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.state.lock().unwrap();

        let recent = state
            .requests
            .iter()
            .filter(|r| r.from_user_id == *sender_id && r.created_at >= window_start)
            .count() as i64;
        if recent >= max_in_window {
            return Err(error::SystemError::too_many_requests(
                "Too many friend requests sent, please try again later",
            ));
        }

        let duplicate = state
            .requests
            .iter()
            .any(|r| r.from_user_id == *sender_id && r.to_user_id == *recipient_id);
        if duplicate {
            return Err(error::SystemError::conflict("Friend request already exists"));
        }

        let now = Utc::now();
        let request = FriendRequestEntity {
            id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
            from_user_id: *sender_id,
            to_user_id: *recipient_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(request)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryMem {
    async fn respond_friend_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        decision: Decision,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.state.lock().unwrap();

        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == *request_id && r.to_user_id == *responder_id)
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.status != RequestStatus::Pending {
            return Err(error::SystemError::conflict("Friend request already responded to"));
        }

        request.status = match decision {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Reject => RequestStatus::Rejected,
        };
        request.updated_at = Utc::now();
        let updated = request.clone();

        if decision == Decision::Accept {
            let (user_a, user_b) = ordered_pair(updated.from_user_id, updated.to_user_id);
            let exists =
                state.friendships.iter().any(|f| f.user_a == user_a && f.user_b == user_b);
            if !exists {
                state.friendships.push(FriendshipEntity {
                    id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                    user_a,
                    user_b,
                    created_at: Utc::now(),
                });
            }
        }

        Ok(updated)
    }
}
