use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest, TokenResponse, UserResponse, UserUpdateRequest},
        extractors::{AdminUser, CurrentUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/users", get(list_users))
        .route("/auth/users/:id", get(get_user).put(update_user))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_signup(payload: &SignupRequest) -> Result<(), AppError> {
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    let len = payload.username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 3 to 50 characters".into(),
        ));
    }
    if payload.password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();
    validate_signup(&payload)?;

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }
    if User::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    // The unique constraints still backstop a concurrent duplicate signup;
    // From<sqlx::Error> turns that into the same 409.
    let user = User::create(
        &state.db,
        &payload.email,
        &payload.username,
        payload.full_name.as_deref(),
        &hash,
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(TokenResponse::bearer(token))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = match User::find_by_username(&state.db, payload.username.trim()).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login with unknown username");
            return Err(AppError::Unauthorized(
                "Incorrect username or password".into(),
            ));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(AppError::Unauthorized(
            "Incorrect username or password".into(),
        ));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login on deactivated account");
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(UserResponse::from(user)))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = payload.email.as_deref() {
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
    }
    if let Some(username) = payload.username.as_deref() {
        let len = username.chars().count();
        if !(3..=50).contains(&len) {
            return Err(AppError::Validation(
                "Username must be 3 to 50 characters".into(),
            ));
        }
    }
    let password_hash = match payload.password.as_deref() {
        Some(p) if p.chars().count() < 8 => {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".into(),
            ))
        }
        Some(p) => Some(hash_password(p)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        payload.email.as_deref(),
        payload.username.as_deref(),
        payload.full_name.as_deref(),
        password_hash.as_deref(),
        payload.is_active,
        payload.is_admin,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(admin_id = %admin.id, user_id = %user.id, "user updated by admin");
    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, username: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            username: username.into(),
            password: password.into(),
            full_name: None,
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(validate_signup(&signup("a@b.test", "alice", "longenough")).is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        let err = validate_signup(&signup("not-an-email", "alice", "longenough")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_short_username() {
        let err = validate_signup(&signup("a@b.test", "al", "longenough")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_signup(&signup("a@b.test", "alice", "short")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_short_multibyte_password() {
        // 4 characters, 12 bytes; length must count characters
        let err = validate_signup(&signup("a@b.test", "alice", "密码密码")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn email_regex_basics() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@mail.com"));
        assert!(!is_valid_email("@example.com"));
    }
}
