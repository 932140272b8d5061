use crate::api::{attendance, leave_request, payroll};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Context, Result};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` requests, replenished evenly.
pub fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limiter settings")
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(limiter))
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/employee/{employee_id}
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(leave_request::employee_leaves)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance?year=&month=
                    .service(web::resource("").route(web::get().to(attendance::list_month)))
                    .service(web::resource("/init").route(web::post().to(attendance::init_month)))
                    .service(
                        web::resource("/finalize")
                            .route(web::post().to(attendance::finalize_month)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}").route(web::put().to(attendance::update_attendance)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll?year=&month=
                    .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
                    .service(
                        web::resource("/generate").route(web::post().to(payroll::generate_payroll)),
                    )
                    .service(
                        web::resource("/process").route(web::post().to(payroll::process_batch)),
                    )
                    // /payroll/{id}
                    .service(web::resource("/{id}").route(web::get().to(payroll::get_payroll)))
                    .service(
                        web::resource("/{id}/mark-paid").route(web::post().to(payroll::mark_paid)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_zero_rate() {
        assert!(build_limiter(0).is_ok());
    }

    #[test]
    fn limiter_accepts_rates_above_one_per_millisecond() {
        assert!(build_limiter(120_000).is_ok());
    }
}
