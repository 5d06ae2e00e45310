use crate::awards::{AwardSummaryDocument, HonourRoll, SummaryStoreError};
use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::http::{with_service_routes, AppState, AwardState};
use crate::sources::CatalogImporter;
use crate::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.catalog.take() {
        config.awards.catalog_path = path;
    }
    if let Some(path) = args.summary.take() {
        config.awards.summary_path = path;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = CatalogImporter::from_path(&config.awards.catalog_path)?;
    let (roll, generated_at) = match AwardSummaryDocument::load(&config.awards.summary_path) {
        Ok(document) => (HonourRoll::new(document.summaries), Some(document.generated_at)),
        Err(SummaryStoreError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            warn!(
                path = %config.awards.summary_path.display(),
                "no award summary yet, serving an empty honour roll"
            );
            (HonourRoll::default(), None)
        }
        Err(err) => return Err(err.into()),
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };
    let award_state = AwardState {
        catalog: Arc::new(catalog),
        roll: Arc::new(roll),
        generated_at,
        rules: Arc::new(config.awards.clone()),
    };

    let app = with_service_routes(award_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "summit award service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
