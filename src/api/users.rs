//! User account endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/users` | Register a user |
//! | GET | `/users` | List users |
//! | GET | `/users/{id}` | Read one user |
//! | PUT | `/users/{id}` | Change username and/or email |
//! | DELETE | `/users/{id}` | Remove a user |

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::{AppState, Pagination, error::ServiceError, with_db};
use crate::{
    db::{self, DbError, UserRow},
    models::Id,
};

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;
const USERNAME_TAKEN: &str = "Username already registered";
const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    /// Unique login name, at most 50 characters.
    pub username: String,
    pub email: String,
}

/// Fields left out are not changed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserPath {
    /// User id.
    id: Id,
}

fn validate_username(username: &str) -> Result<(), ServiceError> {
    let len = username.chars().count();
    if username.trim().is_empty() || len > MAX_USERNAME_LEN {
        return Err(ServiceError::Validation(format!(
            "username must be 1 to {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email.chars().count() > MAX_EMAIL_LEN || !is_valid_email(email) {
        return Err(ServiceError::Validation(format!("'{email}' is not a valid email address")));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty() && !domain.ends_with('.'))
}

fn username_taken(err: DbError) -> ServiceError {
    match err {
        DbError::DuplicateEntry(_) => ServiceError::BadRequest(USERNAME_TAKEN.to_string()),
        other => other.into(),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserCreate,
    responses(
        (status = 200, description = "User created", body = UserRow),
        (status = 400, description = "Username already registered", body = ServiceError),
        (status = 422, description = "Invalid username or email", body = ServiceError),
    )
)]
pub async fn api_create_user(
    State(app_state): State<AppState>,
    Json(body): Json<UserCreate>,
) -> Result<Json<UserRow>, ServiceError> {
    validate_username(&body.username)?;
    validate_email(&body.email)?;

    let user = with_db(&app_state.db_pool, move |conn| {
        if db::get_user_by_username(conn, &body.username)?.is_some() {
            return Err(ServiceError::BadRequest(USERNAME_TAKEN.to_string()));
        }
        db::create_user(conn, &body.username, &body.email).map_err(username_taken)
    })
    .await?;

    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(Pagination),
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserRow>),
    )
)]
pub async fn api_list_users(
    State(app_state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<UserRow>>, ServiceError> {
    let (limit, offset) = page.resolve();
    let users = with_db(&app_state.db_pool, move |conn| db::list_users(conn, limit, offset)).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(UserPath),
    responses(
        (status = 200, description = "User found", body = UserRow),
        (status = 404, description = "User not found", body = ServiceError),
    )
)]
pub async fn api_get_user(
    State(app_state): State<AppState>,
    Path(UserPath { id }): Path<UserPath>,
) -> Result<Json<UserRow>, ServiceError> {
    with_db(&app_state.db_pool, move |conn| db::get_user_by_id(conn, id))
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(USER_NOT_FOUND.to_string()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(UserPath),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserRow),
        (status = 400, description = "Username already registered", body = ServiceError),
        (status = 404, description = "User not found", body = ServiceError),
        (status = 422, description = "Invalid username or email", body = ServiceError),
    )
)]
pub async fn api_update_user(
    State(app_state): State<AppState>,
    Path(UserPath { id }): Path<UserPath>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<UserRow>, ServiceError> {
    if let Some(username) = &body.username {
        validate_username(username)?;
    }
    if let Some(email) = &body.email {
        validate_email(email)?;
    }

    with_db(&app_state.db_pool, move |conn| {
        db::update_user(conn, id, body.username.as_deref(), body.email.as_deref()).map_err(username_taken)
    })
    .await?
    .map(Json)
    .ok_or_else(|| ServiceError::NotFound(USER_NOT_FOUND.to_string()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(UserPath),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ServiceError),
    )
)]
pub async fn api_delete_user(
    State(app_state): State<AppState>,
    Path(UserPath { id }): Path<UserPath>,
) -> Result<StatusCode, ServiceError> {
    let deleted = with_db(&app_state.db_pool, move |conn| db::delete_user(conn, id)).await?;
    if !deleted {
        return Err(ServiceError::NotFound(USER_NOT_FOUND.to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        for ok in ["a@b.co", "alice.kim@petple.kr", "x+tag@mail.example.com"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["", "alice", "@petple.kr", "alice@", "alice@petple", "a@b@c.kr", "a b@c.kr", "a@.kr", "a@b."] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"가".repeat(50)).is_ok());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }
}
