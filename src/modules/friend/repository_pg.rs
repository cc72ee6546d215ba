use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::{Decision, FriendResponse},
        repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
        schema::{FriendRequestEntity, FriendshipEntity, RequestStatus, ordered_pair},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let (user_a, user_b) = ordered_pair(*user_id_a, *user_id_b);

        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friends WHERE user_a = $1 AND user_b = $2",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
            SELECT
                u.id,
                u.username,
                u.email
            FROM friends f
            JOIN users u
                ON u.id = CASE
                    WHEN f.user_a = $1 THEN f.user_b
                    ELSE f.user_a
                END
            WHERE f.user_a = $1
               OR f.user_b = $1
            ORDER BY f.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_pending_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT * FROM friend_requests
            WHERE to_user_id = $1 AND status = 'pending'
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn count_recent_requests(
        &self,
        sender_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, error::SystemError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM friend_requests WHERE from_user_id = $1 AND created_at >= $2",
        )
        .bind(sender_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        window_start: DateTime<Utc>,
        max_in_window: i64,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // serialize sends per sender so the window count cannot race
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(sender_id)
            .execute(&mut *tx)
            .await?;

        let recent: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM friend_requests WHERE from_user_id = $1 AND created_at >= $2",
        )
        .bind(sender_id)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        if recent >= max_in_window {
            tx.rollback().await?;
            return Err(error::SystemError::too_many_requests(
                "Too many friend requests sent, please try again later",
            ));
        }

        let created = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (from_user_id, to_user_id)
            VALUES ($1, $2)
            ON CONFLICT (from_user_id, to_user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(created) = created else {
            tx.rollback().await?;
            return Err(error::SystemError::conflict("Friend request already exists"));
        };

        tx.commit().await?;

        Ok(created)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn respond_friend_request_atomic(
        &self,
        request_id: &Uuid,
        responder_id: &Uuid,
        decision: Decision,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // addressee scoping doubles as the authorization check
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 AND to_user_id = $2 FOR UPDATE",
        )
        .bind(request_id)
        .bind(responder_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.status != RequestStatus::Pending {
            tx.rollback().await?;
            return Err(error::SystemError::conflict("Friend request already responded to"));
        }

        let status = match decision {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Reject => RequestStatus::Rejected,
        };

        let updated = sqlx::query_as::<_, FriendRequestEntity>(
            "UPDATE friend_requests SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(request_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if decision == Decision::Accept {
            let (user_a, user_b) = ordered_pair(request.from_user_id, request.to_user_id);

            sqlx::query("INSERT INTO friends (user_a, user_b) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(user_a)
                .bind(user_b)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }
}
