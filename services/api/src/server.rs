use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryMailer, InMemoryPlacementRepository};
use crate::routes::with_placement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use skillpilot::config::AppConfig;
use skillpilot::error::AppError;
use skillpilot::telemetry;
use skillpilot::workflows::placement::PlacementService;
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
        ranking: config.ranking,
    };

    let repository = Arc::new(if args.empty {
        InMemoryPlacementRepository::default()
    } else {
        InMemoryPlacementRepository::seeded()
    });
    let mailer = Arc::new(InMemoryMailer::default());
    let placement_service =
        Arc::new(PlacementService::new(repository, mailer).with_deadlines(config.ranking.deadlines));

    let app = with_placement_routes(placement_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        student_policy = %config.ranking.student_policy,
        opportunity_policy = %config.ranking.opportunity_policy,
        deadlines = ?config.ranking.deadlines,
        "placement portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
