use crate::cli::ServeArgs;
use crate::infra::{build_pipeline, AppState, SnapshotSink};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_pipeline::config::AppConfig;
use talent_pipeline::error::AppError;
use talent_pipeline::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed) = args.seed.take() {
        config.pipeline.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = build_pipeline(
        config.pipeline.settings(),
        SnapshotSink::from_path(config.pipeline.snapshot_path.clone()),
        config.pipeline.seed_path.as_deref(),
    )?;

    let app = with_pipeline_routes(Arc::new(pipeline), config.pipeline.default_actor())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}
