use crate::cli::ServeArgs;
use crate::infra::{build_services, seed_demo_store, AppState, Approvals};
use crate::routes::with_payroll_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use nomina::config::AppConfig;
use nomina::error::AppError;
use nomina::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

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

    let store = seed_demo_store(&config.payroll)?;
    let (approvals, prenomina) = build_services(&store, &config);
    let scheduler = spawn_escalation_scheduler(approvals.clone(), config.escalation.sweep_interval());

    let app = with_payroll_routes(approvals, prenomina)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        threshold_hours = config.escalation.threshold_hours,
        "payroll back office ready"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    readiness_flag.store(false, Ordering::Release);
    scheduler.abort();
    served?;
    info!("payroll back office stopped");
    Ok(())
}

/// Runs one escalation sweep per tick. A failed pass is logged and retried on the next tick.
fn spawn_escalation_scheduler(approvals: Arc<Approvals>, every: Duration) -> JoinHandle<()> {
    let engine = approvals.engine_handle();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = engine.process_pending_escalations(Utc::now()) {
                error!(error = %err, "escalation sweep aborted");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
