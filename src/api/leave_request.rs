use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::Leaves;
use crate::model::leave_request::{LeaveDecision, LeaveRequest, LeaveStatus, LeaveType};
use crate::service::LeaveApplication;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-06-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: Option<String>,
    #[schema(example = "CASUAL_LEAVE")]
    pub leave_type: LeaveType,
}

impl From<CreateLeave> for LeaveApplication {
    fn from(payload: CreateLeave) -> Self {
        Self {
            employee_id: payload.employee_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
            leave_type: payload.leave_type,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[schema(example = "PENDING")]
    pub status: Option<LeaveStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub total: usize,
}

impl From<Vec<LeaveRequest>> for LeaveListResponse {
    fn from(data: Vec<LeaveRequest>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates or insufficient balance", body = Object, example = json!({
            "message": "Insufficient leave balance. Requesting: 5, Available: 2"
        })),
        (status = 404, description = "Employee not found or inactive")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    leaves: web::Data<Leaves>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let leave = leaves.apply_leave(payload.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved, balance debited and attendance marked", body = LeaveRequest),
        (status = 400, description = "Insufficient balance"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "message": "Leave request 7 is already processed (APPROVED)"
        }))
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    leaves: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = leaves
        .update_status(path.into_inner(), LeaveDecision::Approved)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    leaves: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = leaves
        .update_status(path.into_inner(), LeaveDecision::Rejected)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request 7 not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    leaves: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = leaves.get_leave(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests, latest start date first", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    leaves: web::Data<Leaves>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let data = leaves.list(query.status).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(data)))
}

#[utoipa::path(
    get,
    path = "/api/leave/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose leave history is listed")
    ),
    responses(
        (status = 200, description = "Leave history of one employee", body = LeaveListResponse)
    ),
    tag = "Leave"
)]
pub async fn employee_leaves(
    leaves: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let data = leaves.list_for_employee(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(data)))
}
