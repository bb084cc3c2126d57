use crate::cli::ServeArgs;
use crate::infra::{load_reimbursements, seed_staff, AppState, LoggingMailingList, TracingNotifier};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hackreg::config::AppConfig;
use hackreg::error::AppError;
use hackreg::telemetry;
use hackreg::workflows::registration::{InMemoryStore, RegistrationService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let reimbursements = load_reimbursements(config.registration.reimbursement_csv.as_deref())?;
    info!(
        countries = reimbursements.len(),
        "reimbursement table loaded"
    );

    let staff = Arc::new(seed_staff());
    let service = Arc::new(
        RegistrationService::new(
            Arc::new(InMemoryStore::default()),
            Arc::new(TracingNotifier::default()),
            Arc::new(LoggingMailingList),
            staff.clone(),
            config.registration.clone(),
        )
        .with_reimbursements(Arc::new(reimbursements)),
    );

    let app = with_registration_routes(service, staff)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        hackathon = %config.registration.hackathon_name,
        "registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
