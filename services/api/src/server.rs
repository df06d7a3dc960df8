use crate::cli::ServeArgs;
use crate::infra::{build_gateway, AppState, InMemorySessionStore};
use crate::routes::with_intake_routes;
use availability_intake::config::AppConfig;
use availability_intake::error::AppError;
use availability_intake::intake::{AvailabilityGateway, IntakeSessionService, SessionStore};
use availability_intake::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

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

    let store = Arc::new(InMemorySessionStore::default());
    let gateway = Arc::new(build_gateway(&config.intake));
    let intake_service = Arc::new(
        IntakeSessionService::new(store, gateway, config.intake.checker.clone())
            .with_idle_timeout(config.intake.session_idle_timeout),
    );
    tokio::spawn(expire_idle_sessions(Arc::clone(&intake_service)));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        policy = ?config.intake.gateway_policy,
        latency_ms = config.intake.gateway_latency.as_millis() as u64,
        "availability intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn expire_idle_sessions<S, G>(service: Arc<IntakeSessionService<S, G>>)
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    let mut ticker = tokio::time::interval(IDLE_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        if let Err(err) = service.expire_idle() {
            warn!(error = %err, "idle session sweep failed");
        }
    }
}
