use actix_web::{
    HttpRequest,
    cookie::{Cookie, time},
    get, post, web,
};
use uuid::Uuid;

use crate::modules::user::model::SignUpResponse;
use crate::modules::user::{model, service::UserService};
use crate::{
    ENV,
    api::{error, success},
    middlewares::get_claims,
    utils::{ValidatedJson, ValidatedQuery},
};

fn refresh_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build("refresh_token", token)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age_secs))
        .finish()
}

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<SignUpResponse>, error::Error> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(SignUpResponse { id: user_id })).message("Signup successful"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let (access_token, refresh_token) = user_service.sign_in(user_data.0).await?;

    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Signin successful")
        .cookies(vec![refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)]))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let token = req.cookie("refresh_token").map(|c| c.value().to_string());
    let (access_token, refresh_token) = user_service.refresh(token).await?;

    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Refresh successful")
        .cookies(vec![refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)]))
}

#[get("/signout")]
pub async fn sign_out(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let token = req.cookie("refresh_token").map(|c| c.value().to_string());
    user_service.sign_out(token).await?;

    let expired = Cookie::build("refresh_token", "")
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish();

    Ok(success::Success::no_content().cookies(vec![expired]))
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/search")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    query: ValidatedQuery<model::SearchUsersQuery>,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let params = query.0;
    let users =
        user_service.search_users(&params.query, params.page, params.per_page).await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}
