use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::user::schema::UserEntity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<UserEntity> for FriendResponse {
    fn from(user: UserEntity) -> Self {
        FriendResponse { id: user.id, username: user.username, email: user.email }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub recipient_id: Uuid,
}

/// Closed set of responses; anything else dies at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Deserialize, Validate)]
pub struct RespondRequestBody {
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parses_lowercase_names() {
        assert_eq!(serde_json::from_str::<Decision>("\"accept\"").unwrap(), Decision::Accept);
        assert_eq!(serde_json::from_str::<Decision>("\"reject\"").unwrap(), Decision::Reject);
    }

    #[test]
    fn decision_rejects_unknown_values() {
        assert!(serde_json::from_str::<Decision>("\"maybe\"").is_err());
        assert!(serde_json::from_str::<Decision>("\"Accept\"").is_err());
        assert!(serde_json::from_str::<RespondRequestBody>(r#"{"decision":"block"}"#).is_err());
    }
}
