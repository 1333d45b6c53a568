use crate::cli::ServeArgs;
use crate::infra::{load_registry, AppState};
use crate::routes::calculator_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pmrt_calc::config::AppConfig;
use pmrt_calc::error::AppError;
use pmrt_calc::telemetry;
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
    args.calculator.apply(&mut config);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let registry = load_registry(&config.calculator.data_dir)?;
    // The default model must exist and accept the configured variant.
    registry
        .get(&config.calculator.model)?
        .form(&config.calculator.variant)?;

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        registry: Arc::new(registry),
        variant: Arc::new(config.calculator.variant.clone()),
        default_model: Arc::from(config.calculator.model.as_str()),
    };

    let app = calculator_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, model = %config.calculator.model, "pmrt calculator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
