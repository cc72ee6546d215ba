use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::ENV;
use crate::api::error;
use crate::configs::RedisCache;
use crate::modules::user::model::{InsertUser, SignInModel, SignUpModel, UserResponse};
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserRole;
use crate::utils::{Claims, TypeClaims, hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<RedisCache>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<RedisCache>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        let key = format!("user:{}", id);
        if let Some(cached_user) = self.cache.get::<UserResponse>(&key).await? {
            return Ok(cached_user);
        }

        let entity = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let user = UserResponse::from(entity);
        self.cache.set(&key, &user, 3600).await?;
        Ok(user)
    }

    pub async fn search_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<UserResponse>, error::SystemError> {
        let limit = per_page as i64;
        let offset = (page.saturating_sub(1) * per_page) as i64;

        let users = self.repo.search_users(query, limit, offset).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user =
            InsertUser { username: user.username, email: user.email, hash_password };

        let user_id = self.repo.create(&new_user).await?;
        Ok(user_id)
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<(String, String), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&user.email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid email or password"));
        }

        self.issue_tokens(&user_entity.id, &user_entity.role).await
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::SystemError> {
        let token = refresh_token
            .ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, ENV.jwt_secret.as_ref())
            .map_err(|_| error::SystemError::unauthorized("Invalid refresh token"))?;

        if claims._type != Some(TypeClaims::RefreshToken) {
            return Err(error::SystemError::unauthorized("Invalid refresh token"));
        }

        let jti = claims
            .jti
            .ok_or_else(|| error::SystemError::unauthorized("Invalid refresh token"))?;

        let key = format!("refresh_token:{jti}");
        let user_id: Uuid = self
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Refresh token revoked"))?;

        // rotation: the old token dies with its jti
        self.cache.delete(&key).await?;

        self.issue_tokens(&user_id, &claims.role).await
    }

    pub async fn sign_out(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(), error::SystemError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        let Ok(claims) = Claims::decode(&token, ENV.jwt_secret.as_ref()) else {
            return Ok(());
        };

        if let Some(jti) = claims.jti {
            self.cache.delete(&format!("refresh_token:{jti}")).await?;
        }
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user_id: &Uuid,
        role: &UserRole,
    ) -> Result<(String, String), error::SystemError> {
        let access_token = Claims::new(user_id, role, ENV.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let jti = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let refresh_token = Claims::new(user_id, role, ENV.refresh_token_expiration)
            .with_jti(jti)
            .with_type(TypeClaims::RefreshToken)
            .encode(ENV.jwt_secret.as_ref())?;

        let refresh_key = format!("refresh_token:{jti}");
        self.cache.set(&refresh_key, user_id, ENV.refresh_token_expiration).await?;

        Ok((access_token, refresh_token))
    }
}
