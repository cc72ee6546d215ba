use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{model::InsertUser, schema::UserEntity},
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_email(&self, email: &str)
    -> Result<Option<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;

    /// Case-insensitive exact match on email, or case-insensitive substring
    /// match on username.
    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;
}
