use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub environment: String,
    pub started_at: std::time::Instant,
}

/* -------------------------
   Domain enums
--------------------------*/

/// Stored as text in app_user.role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "DOCTOR",
            Role::Patient => "PATIENT",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "DOCTOR" => Some(Role::Doctor),
            "PATIENT" => Some(Role::Patient),
            _ => None,
        }
    }
}

/// Stored as text in appointment.status. PENDING and COMPLETED count toward
/// the one-active-appointment-per-doctor-day rule; CANCELLED does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<AppointmentStatus> {
        match s {
            "PENDING" => Some(AppointmentStatus::Pending),
            "COMPLETED" => Some(AppointmentStatus::Completed),
            "CANCELLED" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

/* -------------------------
   Response envelope
--------------------------*/

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// page/limit are 1-based; out-of-range values are clamped rather than
/// passed through to SQL. Returns (page, limit, offset).
pub fn clamp_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit, (page - 1) * limit)
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            status_code: StatusCode::OK.as_u16(),
            message: message.to_string(),
            data,
            meta: None,
        }
    }

    pub fn created(message: &str, data: T) -> Self {
        Self {
            success: true,
            status_code: StatusCode::CREATED.as_u16(),
            message: message.to_string(),
            data,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub specialization: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AppointmentRow {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/* -------------------------
   Public projections
--------------------------*/

/// User as exposed by registration and directory listings. The password
/// hash never leaves the row model.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    pub photo_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for PublicUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.user_id,
            name: row.name,
            email: row.email,
            role: row.role,
            specialization: row.specialization,
            photo_url: row.photo_url,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_text_roundtrip() {
        assert_eq!(Role::parse("DOCTOR"), Some(Role::Doctor));
        assert_eq!(Role::parse("PATIENT"), Some(Role::Patient));
        assert_eq!(Role::Doctor.as_str(), "DOCTOR");
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::parse("doctor"), None);
    }

    #[test]
    fn status_text_roundtrip() {
        for s in ["PENDING", "COMPLETED", "CANCELLED"] {
            assert_eq!(AppointmentStatus::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(AppointmentStatus::parse("DONE"), None);
        assert_eq!(AppointmentStatus::parse("pending"), None);
    }

    #[test]
    fn page_meta_total_pages_is_ceiling() {
        assert_eq!(PageMeta::new(1, 10, 0).total_pages, 0);
        assert_eq!(PageMeta::new(1, 10, 10).total_pages, 1);
        assert_eq!(PageMeta::new(1, 10, 11).total_pages, 2);
        assert_eq!(PageMeta::new(1, 3, 7).total_pages, 3);
    }

    #[test]
    fn pagination_clamps_bad_input() {
        assert_eq!(clamp_pagination(None, None), (1, 10, 0));
        assert_eq!(clamp_pagination(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(clamp_pagination(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(clamp_pagination(Some(-5), Some(-5)), (1, 1, 0));
        assert_eq!(clamp_pagination(Some(2), Some(1000)), (2, 100, 100));
    }
}
