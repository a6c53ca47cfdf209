// src/routes/user_routes.rs

use axum::{
    Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, AppQuery},
    middleware::auth_context::{AuthContext, authorize},
    models::{ApiResponse, AppState, PageMeta, PublicUser, Role, clamp_pagination},
};

/// Static catalog offered to the registration UI; not derived from data.
pub const SPECIALIZATIONS: [&str; 10] = [
    "Cardiology",
    "Dermatology",
    "Endocrinology",
    "Gastroenterology",
    "Neurology",
    "Oncology",
    "Orthopedics",
    "Pediatrics",
    "Psychiatry",
    "Radiology",
];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors))
        .route("/patients", get(list_patients))
        .route("/specializations", get(list_specializations))
}

/* ============================================================
   GET /doctors (public)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct DoctorsQuery {
    pub specialization: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_doctors(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<DoctorsQuery>,
) -> Result<ApiResponse<Vec<PublicUser>>, ApiError> {
    let (page, limit, offset) = clamp_pagination(q.page, q.limit);
    let specialization = q
        .specialization
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let search = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let doctors: Vec<PublicUser> = sqlx::query_as(
        r#"
        SELECT user_id AS id, name, email, role, specialization, photo_url, created_at
        FROM app_user
        WHERE role = 'DOCTOR'
          AND ($1::text IS NULL OR specialization = $1)
          AND ($2::text IS NULL
               OR name ILIKE '%' || $2 || '%'
               OR specialization ILIKE '%' || $2 || '%')
        ORDER BY name ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(specialization)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM app_user
        WHERE role = 'DOCTOR'
          AND ($1::text IS NULL OR specialization = $1)
          AND ($2::text IS NULL
               OR name ILIKE '%' || $2 || '%'
               OR specialization ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(specialization)
    .bind(search)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(ApiResponse::ok("Doctors retrieved successfully", doctors)
        .with_meta(PageMeta::new(page, limit, total)))
}

/* ============================================================
   GET /patients (doctor only)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct PatientsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_patients(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(q): AppQuery<PatientsQuery>,
) -> Result<ApiResponse<Vec<PublicUser>>, ApiError> {
    authorize(&auth, &[Role::Doctor])?;

    let (page, limit, offset) = clamp_pagination(q.page, q.limit);

    let patients: Vec<PublicUser> = sqlx::query_as(
        r#"
        SELECT user_id AS id, name, email, role, specialization, photo_url, created_at
        FROM app_user
        WHERE role = 'PATIENT'
        ORDER BY name ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM app_user WHERE role = 'PATIENT'
        "#,
    )
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(ApiResponse::ok("Patients retrieved successfully", patients)
        .with_meta(PageMeta::new(page, limit, total)))
}

/* ============================================================
   GET /specializations (public)
   ============================================================ */

pub async fn list_specializations() -> ApiResponse<Vec<&'static str>> {
    ApiResponse::ok(
        "Specializations retrieved successfully",
        SPECIALIZATIONS.to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specializations_are_fixed_and_ordered() {
        assert_eq!(SPECIALIZATIONS.len(), 10);
        assert_eq!(SPECIALIZATIONS[0], "Cardiology");
        assert_eq!(SPECIALIZATIONS[9], "Radiology");
        // stable order, no duplicates
        let mut names = SPECIALIZATIONS.to_vec();
        names.dedup();
        assert_eq!(names.len(), 10);
    }
}
