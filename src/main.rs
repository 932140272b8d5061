use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_ledger::clock::{Clock, DefaultClock};
use hrm_ledger::config::Config;
use hrm_ledger::db::init_db;
use hrm_ledger::docs::ApiDoc;
use hrm_ledger::routes;
use hrm_ledger::service::{AttendanceService, LeaveService, PayrollService};
use hrm_ledger::store::MySqlStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let limiter = routes::build_limiter(config.rate_protected_per_min)?;

    let store = Arc::new(MySqlStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let leaves = Data::new(LeaveService::new(store.clone(), clock.clone()));
    let attendance = Data::new(AttendanceService::new(store.clone()));
    let payrolls = Data::new(PayrollService::new(
        store,
        clock,
        config.payroll_settle_delay,
    ));

    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();

    info!(addr = %server_addr, prefix = %api_prefix, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} matches the JS/CSS assets
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(leaves.clone())
            .app_data(attendance.clone())
            .app_data(payrolls.clone())
            .configure(|cfg| routes::configure(cfg, &api_prefix, &limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
