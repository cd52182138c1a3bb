/// User account endpoints
///
/// # Endpoints
///
/// - `POST /users` - Register (public)
/// - `POST /users/login` - Issue a session token (public)
/// - `POST /users/logout` - Revoke the current session token
/// - `POST /users/logoutAll` - Revoke every session token
/// - `GET /users/me` - Fetch own profile
/// - `PATCH /users/me` - Update own profile (name, email, password, age)
/// - `DELETE /users/me` - Delete own account (cascades task deletion)
///
/// Serialized users never include the password hash, session tokens,
/// avatar bytes, or resume path; the [`UserResponse`] DTO carries only
/// public profile fields.

use crate::{
    app::{AppState, AuthSession},
    error::{ApiError, ApiResult, StatusBody},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{password, token},
    models::{
        task::Task,
        user::{CreateUser, UpdateUser, User},
    },
};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Public view of a user account
///
/// This is the only user shape that crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Optional age
    pub age: Option<i32>,

    /// Active-status flag
    pub active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,

    /// Password (also checked against the account policy)
    #[validate(length(min = 7, message = "Password must be at least 7 characters long"))]
    pub password: String,

    /// Optional age
    #[validate(range(min = 10, max = 150, message = "Age must be between 10 and 150"))]
    pub age: Option<i32>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Response carrying a profile and a fresh session token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The account profile
    pub user: UserResponse,

    /// The issued session token
    pub token: String,
}

/// Profile update request
///
/// The allowed field set is exactly {name, email, password, age};
/// unknown keys fail deserialization and reject the whole request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    /// New email address
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,

    /// New password (re-hashed before persisting)
    #[validate(length(min = 7, message = "Password must be at least 7 characters long"))]
    pub password: Option<String>,

    /// New age
    #[validate(range(min = 10, max = 150, message = "Age must be between 10 and 150"))]
    pub age: Option<i32>,
}

/// Extracts the first human-readable message from a validation failure
fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(_, errs)| errs.iter())
        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .next()
        .unwrap_or_else(|| "Validation failed".to_string())
}

/// Register a new user
///
/// Hashes the password (never persisted in plaintext), creates the
/// account, issues the first session token, and fires the welcome
/// notification.
///
/// # Errors
///
/// - `400`: validation failed or email already exists
/// - `500`: server error
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()
        .map_err(|e| ApiError::Validation(first_validation_message(&e)))?;
    password::validate_password_policy(&req.password).map_err(ApiError::Validation)?;

    // Hash before persisting; the plaintext password stops here
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
            age: req.age,
        },
    )
    .await?;

    let token = token::issue(&state.db, user.id, state.jwt_secret()).await?;

    state.mailer.send_account_created(&user.email, &user.name);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: (&user).into(),
            token,
        }),
    ))
}

/// Login endpoint
///
/// Verifies credentials and issues a new session token. The response for
/// an unknown email and a wrong password is identical.
///
/// # Errors
///
/// - `404`: unknown email or wrong password ("User cannot login")
/// - `500`: server error
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let cannot_login = || ApiError::NotFound("User cannot login".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(cannot_login)?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(cannot_login());
    }

    let token = token::issue(&state.db, user.id, state.jwt_secret()).await?;

    Ok(Json(AuthResponse {
        user: (&user).into(),
        token,
    }))
}

/// Logout endpoint
///
/// Revokes exactly the token presented on this request. Other sessions
/// of the same user stay live.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<StatusBody>> {
    token::revoke(&state.db, session.user.id, &session.token).await?;

    Ok(Json(StatusBody::ok("User logged out")))
}

/// Logout-all endpoint
///
/// Clears the user's entire session list, invalidating every token
/// previously issued to them.
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<StatusBody>> {
    token::revoke_all(&state.db, session.user.id).await?;

    Ok(Json(StatusBody::ok("All sessions logged out")))
}

/// Fetch own profile
pub async fn get_me(Extension(session): Extension<AuthSession>) -> Json<UserResponse> {
    Json((&session.user).into())
}

/// Update own profile
///
/// Accepts a partial update over the fixed allow-list {name, email,
/// password, age}. Any other key rejects the entire request before any
/// mutation. A changed password is re-hashed before persisting.
///
/// # Errors
///
/// - `400`: unknown field ("Invalid update") or validation failure
/// - `500`: server error
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<UserResponse>> {
    // Unknown keys fail deserialization outright; nothing is applied
    let req: UpdateUserRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::Validation("Invalid update".to_string()))?;

    req.validate()
        .map_err(|e| ApiError::Validation(first_validation_message(&e)))?;

    let password_hash = match req.password {
        Some(ref candidate) => {
            password::validate_password_policy(candidate).map_err(ApiError::Validation)?;
            Some(password::hash_password(candidate)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        session.user.id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            age: req.age,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    state.mailer.send_account_updated(&user.email, &user.name);

    Ok(Json((&user).into()))
}

/// Delete own account
///
/// Deletes the user's tasks first (explicit cascade step), then the
/// account itself; session rows cascade at the database level. Returns
/// the deleted profile.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<UserResponse>> {
    let user = session.user;

    let removed = Task::delete_by_owner(&state.db, user.id).await?;
    tracing::debug!(user_id = %user.id, removed, "Deleted owned tasks before account removal");

    // Stored resume file goes with the account; failure here must not
    // block the deletion
    if let Some(ref path) = user.resume_path {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(%path, error = %err, "Failed to remove resume file");
        }
    }

    User::delete(&state.db, user.id).await?;

    state.mailer.send_account_removed(&user.email, &user.name);

    Ok(Json((&user).into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            age: Some(30),
            active: true,
            avatar: Some(vec![1, 2, 3]),
            resume_path: Some("uploads/resume/abc".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_excludes_sensitive_fields() {
        let response = UserResponse::from(&sample_user());
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("id"));
        assert!(object.contains_key("email"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("tokens"));
        assert!(!object.contains_key("avatar"));
        assert!(!object.contains_key("resume_path"));
    }

    #[test]
    fn test_register_request_validation() {
        let valid: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "a@x.com",
            "password": "Secret1",
            "age": 30
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let bad_email: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "not-an-email",
            "password": "Secret1"
        }))
        .unwrap();
        assert!(bad_email.validate().is_err());

        let bad_password: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "a@x.com",
            "password": "short"
        }))
        .unwrap();
        assert!(bad_password.validate().is_err());

        let bad_age: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "a@x.com",
            "password": "Secret1",
            "age": 7
        }))
        .unwrap();
        assert!(bad_age.validate().is_err());
    }

    #[test]
    fn test_update_request_rejects_unknown_fields() {
        // The allow-list is {name, email, password, age}
        let err = serde_json::from_value::<UpdateUserRequest>(json!({"active": false}));
        assert!(err.is_err());

        let err = serde_json::from_value::<UpdateUserRequest>(json!({
            "name": "B",
            "role": "admin"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_update_request_accepts_allowed_fields() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "name": "B",
            "email": "b@x.com",
            "password": "NewSecret1",
            "age": 31
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.name.as_deref(), Some("B"));
    }

    #[test]
    fn test_update_request_validates_present_fields() {
        let req: UpdateUserRequest =
            serde_json::from_value(json!({"password": "short"})).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateUserRequest = serde_json::from_value(json!({"age": 200})).unwrap();
        assert!(req.validate().is_err());

        // Long enough for the derive check but rejected by the policy,
        // which handlers apply after structural validation
        let req: UpdateUserRequest =
            serde_json::from_value(json!({"password": "myPassword1"})).unwrap();
        assert!(req.validate().is_ok());
        assert!(password::validate_password_policy(req.password.as_deref().unwrap()).is_err());
    }

    #[test]
    fn test_first_validation_message() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "bad",
            "password": "Secret1"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        assert_eq!(first_validation_message(&errors), "Email address is invalid");
    }
}
