use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredMappingStore};
use crate::routes::with_inspection_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use inspection_ai::config::AppConfig;
use inspection_ai::error::AppError;
use inspection_ai::telemetry;
use inspection_ai::workflows::inspection::InspectionService;
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

    let store = ConfiguredMappingStore::from_path(config.inspection.mapping_path.clone());
    let mapping_source = store.describe();
    let service = Arc::new(InspectionService::from_store(
        Arc::new(store),
        config.inspection.policy.clone(),
    )?);
    info!(
        mappings = service.registry().len(),
        source = %mapping_source,
        jurisdictions = service.policy().expected_trades.len(),
        "trade mapping registry loaded"
    );

    let app = with_inspection_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "inspection readiness service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
