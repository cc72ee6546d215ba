use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One directional request per (from, to) pair, never deleted. Responding
/// moves it to accepted or rejected and stamps `updated_at`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Symmetric friendship, stored once with `user_a < user_b`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Canonical ordering for friendship pairs.
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_pair_is_direction_independent() {
        let x = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let y = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        assert_eq!(ordered_pair(x, y), ordered_pair(y, x));
        let (a, b) = ordered_pair(x, y);
        assert!(a <= b);
    }

    #[test]
    fn request_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RequestStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&RequestStatus::Rejected).unwrap(), "\"rejected\"");
    }
}
