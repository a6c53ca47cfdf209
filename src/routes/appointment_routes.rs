// src/routes/appointment_routes.rs

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, AppJson, AppQuery, is_unique_violation},
    middleware::auth_context::{AuthContext, authorize},
    models::{
        ApiResponse, AppState, AppointmentRow, AppointmentStatus, PageMeta, Role, clamp_pagination,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment))
        .route("/patient", get(get_patient_appointments))
        .route("/doctor", get(get_doctor_appointments))
        .route("/update-status", patch(update_appointment_status))
}

/* ============================================================
   Response DTOs
   ============================================================ */

#[derive(Debug, Serialize)]
pub struct DoctorBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialization: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PatientBrief {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentDto {
    pub id: Uuid,
    #[serde(rename = "doctorId")]
    pub doctor_id: Uuid,
    #[serde(rename = "patientId")]
    pub patient_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientBrief>,
}

/* ============================================================
   Date handling
   ============================================================ */

/// Accepts an RFC 3339 timestamp or a bare YYYY-MM-DD day (midnight UTC).
fn parse_appointment_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(
            d.and_hms_opt(0, 0, 0).unwrap(),
            Utc,
        ));
    }
    None
}

/// Half-open [start, start+1d) window spanning the UTC calendar day of `ts`.
/// Conflicts are decided at this granularity, matching the stored
/// appointment.scheduled_day column.
fn day_window(ts: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = DateTime::<Utc>::from_naive_utc_and_offset(
        ts.date_naive().and_hms_opt(0, 0, 0).unwrap(),
        Utc,
    );
    (start, start + chrono::Duration::days(1))
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<&'static str>, ApiError> {
    match status.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(None),
        Some(s) => match AppointmentStatus::parse(s) {
            Some(st) => Ok(Some(st.as_str())),
            None => Err(ApiError::BadRequest(
                "Invalid status. Must be one of: PENDING, CANCELLED, COMPLETED".into(),
            )),
        },
    }
}

/* ============================================================
   Joined row models
   ============================================================ */

#[derive(Debug, sqlx::FromRow)]
struct PatientViewRow {
    appointment_id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    d_name: String,
    d_email: String,
    d_specialization: Option<String>,
    d_photo_url: Option<String>,
}

impl From<PatientViewRow> for AppointmentDto {
    fn from(r: PatientViewRow) -> Self {
        AppointmentDto {
            id: r.appointment_id,
            doctor_id: r.doctor_id,
            patient_id: r.patient_id,
            date: r.scheduled_at,
            status: r.status,
            created_at: r.created_at,
            doctor: Some(DoctorBrief {
                id: r.doctor_id,
                name: r.d_name,
                email: r.d_email,
                specialization: r.d_specialization,
                photo_url: r.d_photo_url,
            }),
            patient: None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DoctorViewRow {
    appointment_id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    p_name: String,
    p_email: String,
    p_photo_url: Option<String>,
}

impl From<DoctorViewRow> for AppointmentDto {
    fn from(r: DoctorViewRow) -> Self {
        AppointmentDto {
            id: r.appointment_id,
            doctor_id: r.doctor_id,
            patient_id: r.patient_id,
            date: r.scheduled_at,
            status: r.status,
            created_at: r.created_at,
            doctor: None,
            patient: Some(PatientBrief {
                id: r.patient_id,
                name: r.p_name,
                email: r.p_email,
                photo_url: r.p_photo_url,
            }),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailViewRow {
    appointment_id: Uuid,
    doctor_id: Uuid,
    patient_id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    d_name: String,
    d_email: String,
    d_specialization: Option<String>,
    d_photo_url: Option<String>,
    p_name: String,
    p_email: String,
    p_photo_url: Option<String>,
}

impl From<DetailViewRow> for AppointmentDto {
    fn from(r: DetailViewRow) -> Self {
        AppointmentDto {
            id: r.appointment_id,
            doctor_id: r.doctor_id,
            patient_id: r.patient_id,
            date: r.scheduled_at,
            status: r.status,
            created_at: r.created_at,
            doctor: Some(DoctorBrief {
                id: r.doctor_id,
                name: r.d_name,
                email: r.d_email,
                specialization: r.d_specialization,
                photo_url: r.d_photo_url,
            }),
            patient: Some(PatientBrief {
                id: r.patient_id,
                name: r.p_name,
                email: r.p_email,
                photo_url: r.p_photo_url,
            }),
        }
    }
}

async fn load_appointment_detail(
    state: &AppState,
    appointment_id: Uuid,
) -> Result<AppointmentDto, ApiError> {
    let row: DetailViewRow = sqlx::query_as(
        r#"
        SELECT
          a.appointment_id,
          a.doctor_id,
          a.patient_id,
          a.scheduled_at,
          a.status,
          a.created_at,

          d.name AS d_name,
          d.email AS d_email,
          d.specialization AS d_specialization,
          d.photo_url AS d_photo_url,

          p.name AS p_name,
          p.email AS p_email,
          p.photo_url AS p_photo_url

        FROM appointment a
        JOIN app_user d ON d.user_id = a.doctor_id
        JOIN app_user p ON p.user_id = a.patient_id
        WHERE a.appointment_id = $1
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;

    Ok(row.into())
}

/* ============================================================
   POST /appointments (patient books a doctor)
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(rename = "doctorId")]
    pub doctor_id: Uuid,
    pub date: String,
}

pub async fn create_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<CreateAppointmentRequest>,
) -> Result<ApiResponse<AppointmentDto>, ApiError> {
    authorize(&auth, &[Role::Patient])?;

    let scheduled_at = parse_appointment_date(&req.date).ok_or_else(|| {
        ApiError::BadRequest("Invalid date format. Please provide a valid date.".into())
    })?;

    let doctor_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM app_user WHERE user_id = $1 AND role = 'DOCTOR')
        "#,
    )
    .bind(req.doctor_id)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;
    if !doctor_exists {
        return Err(ApiError::NotFound("Doctor not found".into()));
    }

    let patient_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM app_user WHERE user_id = $1 AND role = 'PATIENT')
        "#,
    )
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;
    if !patient_exists {
        return Err(ApiError::NotFound("Patient not found".into()));
    }

    // Pre-check keeps the 409 message exact; the partial unique index on
    // (doctor_id, scheduled_day) for active statuses decides under races.
    let (start, end) = day_window(scheduled_at);
    let conflict: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
          SELECT 1 FROM appointment
          WHERE doctor_id = $1
            AND scheduled_at >= $2
            AND scheduled_at < $3
            AND status IN ('PENDING', 'COMPLETED')
        )
        "#,
    )
    .bind(req.doctor_id)
    .bind(start)
    .bind(end)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    if conflict {
        return Err(ApiError::Conflict(
            "Doctor is not available at this time".into(),
        ));
    }

    let created: AppointmentRow = sqlx::query_as(
        r#"
        INSERT INTO appointment (doctor_id, patient_id, scheduled_at, status)
        VALUES ($1, $2, $3, 'PENDING')
        RETURNING appointment_id, doctor_id, patient_id, scheduled_at, status, created_at
        "#,
    )
    .bind(req.doctor_id)
    .bind(auth.user_id)
    .bind(scheduled_at)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Doctor is not available at this time".into())
        } else {
            ApiError::db(e)
        }
    })?;

    let detail = load_appointment_detail(&state, created.appointment_id).await?;
    Ok(ApiResponse::created(
        "Appointment created successfully",
        detail,
    ))
}

/* ============================================================
   GET /appointments/patient
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct PatientAppointmentsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_patient_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(q): AppQuery<PatientAppointmentsQuery>,
) -> Result<ApiResponse<Vec<AppointmentDto>>, ApiError> {
    authorize(&auth, &[Role::Patient])?;

    let status = parse_status_filter(q.status.as_deref())?;
    let (page, limit, offset) = clamp_pagination(q.page, q.limit);

    let rows: Vec<PatientViewRow> = sqlx::query_as(
        r#"
        SELECT
          a.appointment_id,
          a.doctor_id,
          a.patient_id,
          a.scheduled_at,
          a.status,
          a.created_at,

          d.name AS d_name,
          d.email AS d_email,
          d.specialization AS d_specialization,
          d.photo_url AS d_photo_url

        FROM appointment a
        JOIN app_user d ON d.user_id = a.doctor_id
        WHERE a.patient_id = $1
          AND ($2::text IS NULL OR a.status = $2)
        ORDER BY a.scheduled_at ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(auth.user_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM appointment
        WHERE patient_id = $1
          AND ($2::text IS NULL OR status = $2)
        "#,
    )
    .bind(auth.user_id)
    .bind(status)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(ApiResponse::ok(
        "Patient appointments retrieved successfully",
        rows.into_iter().map(AppointmentDto::from).collect(),
    )
    .with_meta(PageMeta::new(page, limit, total)))
}

/* ============================================================
   GET /appointments/doctor
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct DoctorAppointmentsQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    AppQuery(q): AppQuery<DoctorAppointmentsQuery>,
) -> Result<ApiResponse<Vec<AppointmentDto>>, ApiError> {
    authorize(&auth, &[Role::Doctor])?;

    let status = parse_status_filter(q.status.as_deref())?;
    let (page, limit, offset) = clamp_pagination(q.page, q.limit);

    // Optional exact-day filter, same window math as conflict detection.
    let window = match q.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            let ts = parse_appointment_date(s)
                .ok_or_else(|| ApiError::BadRequest("Invalid date format".into()))?;
            Some(day_window(ts))
        }
        None => None,
    };
    let (start, end) = match window {
        Some((s, e)) => (Some(s), Some(e)),
        None => (None, None),
    };

    let rows: Vec<DoctorViewRow> = sqlx::query_as(
        r#"
        SELECT
          a.appointment_id,
          a.doctor_id,
          a.patient_id,
          a.scheduled_at,
          a.status,
          a.created_at,

          p.name AS p_name,
          p.email AS p_email,
          p.photo_url AS p_photo_url

        FROM appointment a
        JOIN app_user p ON p.user_id = a.patient_id
        WHERE a.doctor_id = $1
          AND ($2::text IS NULL OR a.status = $2)
          AND ($3::timestamptz IS NULL OR (a.scheduled_at >= $3 AND a.scheduled_at < $4))
        ORDER BY a.scheduled_at ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(auth.user_id)
    .bind(status)
    .bind(start)
    .bind(end)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::db)?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM appointment
        WHERE doctor_id = $1
          AND ($2::text IS NULL OR status = $2)
          AND ($3::timestamptz IS NULL OR (scheduled_at >= $3 AND scheduled_at < $4))
        "#,
    )
    .bind(auth.user_id)
    .bind(status)
    .bind(start)
    .bind(end)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::db)?;

    Ok(ApiResponse::ok(
        "Doctor appointments retrieved successfully",
        rows.into_iter().map(AppointmentDto::from).collect(),
    )
    .with_meta(PageMeta::new(page, limit, total)))
}

/* ============================================================
   PATCH /appointments/update-status
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub appointment_id: Uuid,
    pub status: String,
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> Result<ApiResponse<AppointmentDto>, ApiError> {
    authorize(&auth, &[Role::Doctor, Role::Patient])?;

    let status = AppointmentStatus::parse(req.status.trim()).ok_or_else(|| {
        ApiError::BadRequest("Invalid status. Must be one of: PENDING, CANCELLED, COMPLETED".into())
    })?;

    let appointment: AppointmentRow = sqlx::query_as(
        r#"
        SELECT appointment_id, doctor_id, patient_id, scheduled_at, status, created_at
        FROM appointment
        WHERE appointment_id = $1
        "#,
    )
    .bind(req.appointment_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::db)?
    .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;

    // Ownership is mandatory regardless of role.
    let owns = match auth.role {
        Role::Patient => appointment.patient_id == auth.user_id,
        Role::Doctor => appointment.doctor_id == auth.user_id,
    };
    if !owns {
        return Err(ApiError::Forbidden(
            "You can only update your own appointments".into(),
        ));
    }

    // No transition graph: any of the three values is accepted. Moving a
    // CANCELLED row back into the active class can still collide on the
    // (doctor, day) index.
    sqlx::query(
        r#"
        UPDATE appointment
        SET status = $2
        WHERE appointment_id = $1
        "#,
    )
    .bind(req.appointment_id)
    .bind(status.as_str())
    .execute(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Doctor is not available at this time".into())
        } else {
            ApiError::db(e)
        }
    })?;

    let detail = load_appointment_detail(&state, req.appointment_id).await?;
    Ok(ApiResponse::ok(
        "Appointment status updated successfully",
        detail,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_bare_dates() {
        let dt = parse_appointment_date("2025-08-31T14:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-08-31T14:30:00+00:00");

        let day = parse_appointment_date("2025-08-31").unwrap();
        assert_eq!(day.to_rfc3339(), "2025-08-31T00:00:00+00:00");

        assert!(parse_appointment_date("not-a-date").is_none());
        assert!(parse_appointment_date("2025-13-45").is_none());
        assert!(parse_appointment_date("").is_none());
    }

    #[test]
    fn day_window_spans_one_utc_day() {
        let ts = parse_appointment_date("2025-08-31T14:30:00Z").unwrap();
        let (start, end) = day_window(ts);
        assert_eq!(start.to_rfc3339(), "2025-08-31T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-09-01T00:00:00+00:00");

        // last instant of the day still falls inside the window
        let late = parse_appointment_date("2025-08-31T23:59:59Z").unwrap();
        assert!(late >= start && late < end);
        // midnight of the next day does not
        let next = parse_appointment_date("2025-09-01T00:00:00Z").unwrap();
        assert!(!(next < end));
    }

    #[test]
    fn status_filter_accepts_known_values_only() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("")).unwrap(), None);
        assert_eq!(parse_status_filter(Some("PENDING")).unwrap(), Some("PENDING"));
        assert_eq!(
            parse_status_filter(Some("CANCELLED")).unwrap(),
            Some("CANCELLED")
        );

        let err = parse_status_filter(Some("DONE")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status. Must be one of: PENDING, CANCELLED, COMPLETED"
        );
    }
}
