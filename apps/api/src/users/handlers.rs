use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{User, UserProfile};
use crate::permissions::{
    authorize, extract::token_from_headers, is_active, is_authenticated, is_owner,
    is_safe_method, may_write, Principal,
};
use crate::state::AppState;
use crate::users::validation::{ProfileUpdate, RegistrationRequest};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: String,
    /// Defaults when the user has no profile row yet.
    pub profile: Value,
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn new(user: User, profile: Option<UserProfile>) -> Self {
        let profile = profile.unwrap_or_else(|| UserProfile::new(user.id));
        let profile = serde_json::to_value(profile).unwrap_or_else(|_| json!({}));
        ProfileResponse {
            full_name: user.full_name(),
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            is_verified: user.is_verified,
            date_of_birth: user.date_of_birth,
            bio: user.bio,
            profile,
            created_at: user.created_at,
        }
    }
}

async fn load_user(db: &PgPool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

async fn load_profile(db: &PgPool, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(profile)
}

/// GET /api/v1/users/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ProfileResponse>, AppError> {
    authorize(&principal, is_authenticated(&principal))?;
    let user = load_user(&state.db, principal.user_id()?).await?;
    authorize(&principal, is_owner(&principal, &user))?;

    let profile = load_profile(&state.db, user.id).await?;
    Ok(Json(ProfileResponse::new(user, profile)))
}

/// PATCH /api/v1/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    method: Method,
    principal: Principal,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    authorize(&principal, is_active(&principal))?;
    let user = load_user(&state.db, principal.user_id()?).await?;
    authorize(
        &principal,
        may_write(&principal, Some(&user), is_safe_method(&method)),
    )?;

    let update = update.validate()?;
    let user = if update.is_empty() {
        user
    } else {
        let phone = update.new_phone().map(str::to_owned);
        let clear_phone = update.clears_phone();
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                phone = CASE WHEN $8 THEN NULL ELSE COALESCE($5, phone) END,
                bio = COALESCE($6, bio),
                date_of_birth = COALESCE($7, date_of_birth),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(update.username)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(phone)
        .bind(update.bio)
        .bind(update.date_of_birth)
        .bind(clear_phone)
        .fetch_one(&state.db)
        .await?
    };
    info!("Updated profile for user {}", user.id);

    let profile = load_profile(&state.db, user.id).await?;
    Ok(Json(ProfileResponse::new(user, profile)))
}

/// POST /api/v1/users/logout
///
/// Revokes the token the request was made with.
pub async fn handle_logout(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    authorize(&principal, is_authenticated(&principal))?;
    if let Some(key) = token_from_headers(&headers)? {
        sqlx::query("DELETE FROM auth_tokens WHERE key = $1")
            .bind(key)
            .execute(&state.db)
            .await?;
    }
    info!("User {} logged out", principal.user_id()?);
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

/// POST /api/v1/users/validate-registration
///
/// Dry-run of the registration checks, so clients can surface field errors
/// before submitting to the authentication backend.
pub async fn handle_validate_registration(
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    request.validate()?;
    Ok((StatusCode::OK, Json(json!({ "valid": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::tests::sample_user;
    use crate::models::user::DEFAULT_TIMEZONE;

    fn principal_for(user: &User) -> Principal {
        Principal {
            id: Some(user.id),
            authenticated: true,
            verified: user.is_verified,
            active: user.is_active,
            staff: false,
            superuser: false,
        }
    }

    #[test]
    fn test_missing_profile_row_reports_defaults() {
        let response = ProfileResponse::new(sample_user(), None);
        assert_eq!(response.profile["timezone"], DEFAULT_TIMEZONE);
        assert_eq!(response.profile["language"], "en");
        assert_eq!(response.profile["social_links"], json!({}));
        assert!(response.profile.get("user_id").is_none());
    }

    #[test]
    fn test_stored_profile_is_reported() {
        let user = sample_user();
        let profile = UserProfile {
            timezone: "Europe/Berlin".to_string(),
            ..UserProfile::new(user.id)
        };
        let response = ProfileResponse::new(user, Some(profile));
        assert_eq!(response.profile["timezone"], "Europe/Berlin");
    }

    #[test]
    fn test_profile_read_requires_owner() {
        let user = sample_user();
        assert!(authorize(&principal_for(&user), is_owner(&principal_for(&user), &user)).is_ok());

        let other = sample_user();
        let stranger = principal_for(&other);
        assert!(matches!(
            authorize(&stranger, is_owner(&stranger, &user)),
            Err(AppError::Forbidden)
        ));
    }
}
