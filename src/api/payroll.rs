use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::{MonthQuery, Payrolls};
use crate::model::payroll::Payroll;

#[derive(Serialize, ToSchema)]
pub struct PayrollListResponse {
    pub data: Vec<Payroll>,
    #[schema(example = 1)]
    pub total: usize,
}

impl From<Vec<Payroll>> for PayrollListResponse {
    fn from(data: Vec<Payroll>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    params(MonthQuery),
    responses(
        (status = 200, description = "Payroll generated for every salaried employee", body = PayrollListResponse),
        (status = 400, description = "Invalid month"),
        (status = 409, description = "Payroll already generated for the month"),
        (status = 412, description = "Attendance of the month is not finalized", body = Object, example = json!({
            "message": "Attendance for 6/2026 is not finalized"
        }))
    ),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    payrolls: web::Data<Payrolls>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let data = payrolls.generate_payroll(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(PayrollListResponse::from(data)))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(MonthQuery),
    responses(
        (status = 200, description = "Payroll rows of the month", body = PayrollListResponse),
        (status = 400, description = "Invalid month")
    ),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    payrolls: web::Data<Payrolls>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let data = payrolls.list(query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(PayrollListResponse::from(data)))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll found", body = Payroll),
        (status = 404, description = "Payroll not found")
    ),
    tag = "Payroll"
)]
pub async fn get_payroll(
    payrolls: web::Data<Payrolls>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let payroll = payrolls.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

#[utoipa::path(
    post,
    path = "/api/payroll/{payroll_id}/mark-paid",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll marked as paid", body = Payroll),
        (status = 404, description = "Payroll not found")
    ),
    tag = "Payroll"
)]
pub async fn mark_paid(
    payrolls: web::Data<Payrolls>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let payroll = payrolls.mark_as_paid(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payroll))
}

/// Settles the whole month in one batch
#[utoipa::path(
    post,
    path = "/api/payroll/process",
    params(MonthQuery),
    responses(
        (status = 200, description = "Salaries disbursed", body = Object, example = json!({
            "message": "Salaries disbursed",
            "paid": 2
        })),
        (status = 400, description = "Invalid month"),
        (status = 404, description = "No payroll rows for the month")
    ),
    tag = "Payroll"
)]
pub async fn process_batch(
    payrolls: web::Data<Payrolls>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    let paid = payrolls
        .process_payroll_batch(query.year, query.month)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Salaries disbursed",
        "paid": paid
    })))
}
