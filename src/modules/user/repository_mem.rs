//! In-memory stand-in for the Postgres user repository, used by the
//! scenario tests. Uniqueness rules mirror the DB constraints.

use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::InsertUser,
        repository::UserRepository,
        schema::{UserEntity, UserRole},
    },
};

pub struct UserRepositoryMem {
    users: Mutex<Vec<UserEntity>>,
}

impl UserRepositoryMem {
    pub fn new() -> Self {
        Self { users: Mutex::new(Vec::new()) }
    }

    pub fn add_user(&self, username: &str, email: &str) -> Uuid {
        let now = chrono::Utc::now();
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        self.users.lock().unwrap().push(UserEntity {
            id,
            username: username.to_string(),
            email: email.to_string(),
            hash_password: String::new(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub(crate) fn find_sync(&self, id: &Uuid) -> Option<UserEntity> {
        self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned()
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryMem {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.find_sync(id))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|u| u.username == user.username) {
            return Err(error::SystemError::conflict("Username already exists"));
        }
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(error::SystemError::conflict("Email already exists"));
        }

        let now = chrono::Utc::now();
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        users.push(UserEntity {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let q = query.to_lowercase();
        let users = self.users.lock().unwrap();

        let mut hits: Vec<UserEntity> = users
            .iter()
            .filter(|u| u.email.to_lowercase() == q || u.username.to_lowercase().contains(&q))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(hits.into_iter().skip(offset.max(0) as usize).take(limit.max(0) as usize).collect())
    }
}
