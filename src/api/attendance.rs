use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::{Attendances, MonthQuery};
use crate::model::attendance::{Attendance, AttendanceStatus};

#[derive(Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(example = "HALF_DAY")]
    pub status: AttendanceStatus,
    #[schema(example = "Left early")]
    pub remarks: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    /// Whether any row of the month has been locked
    #[schema(example = false)]
    pub finalized: bool,
}

/// Seeds one ABSENT row per active staff member and day of the month
#[utoipa::path(
    post,
    path = "/api/attendance/init",
    params(MonthQuery),
    responses(
        (status = 200, description = "Missing rows created", body = Object, example = json!({
            "message": "Attendance initialized",
            "created": 60
        })),
        (status = 400, description = "Invalid month")
    ),
    tag = "Attendance"
)]
pub async fn init_month(
    attendance: web::Data<Attendances>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let created = attendance.initialize_month(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance initialized",
        "created": created
    })))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "Attendance rows of the month", body = AttendanceListResponse),
        (status = 400, description = "Invalid month")
    ),
    tag = "Attendance"
)]
pub async fn list_month(
    attendance: web::Data<Attendances>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let data = attendance.list_month(query.year, query.month).await?;
    let finalized = attendance.is_month_finalized(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(AttendanceListResponse { data, finalized }))
}

/// Manual correction of a single row
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance row to correct")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = Attendance),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "Attendance row is finalized", body = Object, example = json!({
            "message": "Attendance record 12 is finalized and cannot be updated"
        }))
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    attendance: web::Data<Attendances>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    let UpdateAttendance { status, remarks } = payload.into_inner();
    let row = attendance
        .update_one(path.into_inner(), status, remarks)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

/// Locks every row of the month against further edits
#[utoipa::path(
    post,
    path = "/api/attendance/finalize",
    params(MonthQuery),
    responses(
        (status = 200, description = "Month finalized", body = Object, example = json!({
            "message": "Attendance finalized",
            "finalized": 60
        })),
        (status = 400, description = "Invalid month")
    ),
    tag = "Attendance"
)]
pub async fn finalize_month(
    attendance: web::Data<Attendances>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let finalized = attendance.finalize_month(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance finalized",
        "finalized": finalized
    })))
}
