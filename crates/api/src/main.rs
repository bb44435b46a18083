use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stocksignal_core::domain::financials::FinancialSnapshot;
use stocksignal_core::domain::news::NewsArticle;
use stocksignal_core::domain::recommendation::Action;
use stocksignal_core::domain::symbol::Symbol;
use stocksignal_core::error::{classify, raw_model_output, FailureKind, Stage};
use stocksignal_core::pipeline::{Enrichment, Pipeline};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stocksignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pipeline = match Pipeline::from_settings(&settings) {
        Ok(pipeline) => Some(Arc::new(pipeline)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "pipeline setup failed; starting API in degraded mode");
            None
        }
    };

    let app = router(AppState { pipeline });

    let port = settings.port.unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/enrich-stock/:symbol", get(enrich_stock))
        .route("/notify-stock/:symbol", get(notify_stock))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Option<Arc<Pipeline>>,
}

impl AppState {
    fn pipeline(&self) -> Result<&Pipeline, ApiError> {
        self.pipeline.as_deref().ok_or(ApiError::NotReady)
    }
}

#[derive(Debug, Serialize)]
struct EnrichResponse {
    symbol: Symbol,
    action: Action,
    ai_recommendation: String,
    news: Vec<NewsArticle>,
    financials: FinancialSnapshot,
}

impl From<Enrichment> for EnrichResponse {
    fn from(e: Enrichment) -> Self {
        Self {
            symbol: e.symbol,
            action: e.recommendation.action,
            ai_recommendation: e.recommendation.rationale,
            news: e.articles,
            financials: e.financials,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NotifyQuery {
    to: Option<String>,
}

#[derive(Debug, Serialize)]
struct NotifyResponse {
    message: &'static str,
    sid: String,
    action: Action,
}

async fn enrich_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<EnrichResponse>, ApiError> {
    let pipeline = state.pipeline()?;
    let symbol = Symbol::parse(&symbol)?;
    let enrichment = pipeline.enrich(&symbol).await?;
    Ok(Json(enrichment.into()))
}

async fn notify_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<NotifyQuery>,
) -> Result<Json<NotifyResponse>, ApiError> {
    let pipeline = state.pipeline()?;
    let symbol = Symbol::parse(&symbol)?;
    let outcome = pipeline.notify(&symbol, query.to.as_deref()).await?;
    Ok(Json(NotifyResponse {
        message: "Sent to WhatsApp",
        sid: outcome.delivery_id,
        action: outcome.action,
    }))
}

#[derive(Debug)]
enum ApiError {
    NotReady,
    Pipeline(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Pipeline(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    stage: Option<Stage>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::NotReady => {
                let body = ErrorBody {
                    error: "pipeline is not configured".to_string(),
                    stage: None,
                };
                return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
            }
            ApiError::Pipeline(err) => err,
        };

        let (status, stage) = match classify(&err) {
            FailureKind::InvalidInput => (StatusCode::BAD_REQUEST, None),
            FailureKind::Upstream(stage) => (StatusCode::BAD_GATEWAY, Some(stage)),
            FailureKind::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, None),
            FailureKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        if status.is_server_error() {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(
                %status,
                stage = ?stage,
                error = %err,
                raw_output = raw_model_output(&err),
                "request failed"
            );
        } else {
            tracing::warn!(%status, error = %err, "request rejected");
        }

        let body = ErrorBody {
            error: format!("{err:#}"),
            stage,
        };
        (status, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stocksignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
