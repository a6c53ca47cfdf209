use axum::{
    Router,
    extract::State,
    routing::post,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{hash_password, sign_token, verify_password},
    error::{ApiError, AppJson, is_unique_violation},
    models::{ApiResponse, AppState, PublicUser, Role, UserRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/patient", post(register_patient))
        .route("/register/doctor", post(register_doctor))
        .route("/login", post(login))
}

/* ============================================================
   Request/Response DTOs
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialization: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login echoes the user without created_at.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub photo_url: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: LoginUser,
    pub token: String,
}

/* ============================================================
   Validation
   ============================================================ */

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let e = email.trim();
    if e.is_empty() || !e.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    Ok(())
}

fn validate_password(pw: &str) -> Result<(), ApiError> {
    if pw.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/* ============================================================
   POST /register/patient, /register/doctor
   ============================================================ */

async fn create_user(
    state: &AppState,
    req: RegisterRequest,
    role: Role,
) -> Result<PublicUser, ApiError> {
    validate_name(&req.name)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();

    // specialization is required for doctors, dropped for patients
    let specialization = match role {
        Role::Doctor => match req.specialization.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => {
                return Err(ApiError::BadRequest(
                    "Specialization is required for doctors".into(),
                ));
            }
        },
        Role::Patient => None,
    };

    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM app_user WHERE email = $1)
        "#,
    )
    .bind(&email)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    if exists {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&req.password).map_err(ApiError::Internal)?;

    let user: PublicUser = sqlx::query_as(
        r#"
        INSERT INTO app_user (name, email, password_hash, role, specialization, photo_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING user_id AS id, name, email, role, specialization, photo_url, created_at
        "#,
    )
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(&specialization)
    .bind(&req.photo_url)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        // Two concurrent registrations can both pass the pre-check; the
        // unique index on email decides.
        if is_unique_violation(&e) {
            ApiError::Conflict("User already exists".into())
        } else {
            ApiError::db(e)
        }
    })?;

    Ok(user)
}

pub async fn register_patient(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = create_user(&state, req, Role::Patient).await?;
    Ok(ApiResponse::created(
        "Patient registered successfully",
        user,
    ))
}

pub async fn register_doctor(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = create_user(&state, req, Role::Doctor).await?;
    Ok(ApiResponse::created("Doctor registered successfully", user))
}

/* ============================================================
   POST /login
   ============================================================ */

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".into(),
        ));
    }

    // Unknown email and wrong password must be indistinguishable.
    let user: UserRow = sqlx::query_as(
        r#"
        SELECT user_id, name, email, password_hash, role, specialization, photo_url, created_at
        FROM app_user
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let token = sign_token(
        &state.jwt_secret,
        user.user_id,
        &user.email,
        &user.role,
        state.token_ttl_days,
    )
    .map_err(ApiError::Internal)?;

    Ok(ApiResponse::ok(
        "User logged in successfully",
        LoginData {
            user: LoginUser {
                id: user.user_id,
                name: user.name,
                email: user.email,
                role: user.role,
                photo_url: user.photo_url,
                specialization: user.specialization,
            },
            token,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Alice").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
    }
}
