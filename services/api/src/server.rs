use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_leave_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use gatepass::config::AppConfig;
use gatepass::error::AppError;
use gatepass::telemetry;
use gatepass::workflows::leave::{EmailNotifier, LeaveWorkflowService, RedbStore, SmtpMailer};
use gatepass::workflows::roster::CsvRoster;

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

    let store = Arc::new(RedbStore::open(&config.storage.db_path)?);

    let roster = CsvRoster::load(&config.storage.roster_path)?;
    info!(
        students = roster.len(),
        path = %config.storage.roster_path.display(),
        "student roster loaded"
    );

    let transport = match &config.mail.smtp {
        Some(smtp) => Some(SmtpMailer::from_config(&config.mail, smtp)?),
        None => {
            info!("SMTP not configured; notifications will be logged and skipped");
            None
        }
    };
    let notifier = Arc::new(EmailNotifier::new(
        transport,
        store.clone(),
        config.workflow.admin_email.clone(),
        config.workflow.security_email.clone(),
    ));

    let service = Arc::new(LeaveWorkflowService::new(
        store,
        notifier,
        Arc::new(roster),
        config.workflow.clone(),
    ));

    let app = with_leave_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "gate pass service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
