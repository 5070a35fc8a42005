use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use crate::error::Error;
use crate::predictor::Predictor;
use crate::types::{CategoricalField, FlightQuery, Label, Tier};

// ---------- Response types ----------

#[derive(Serialize)]
struct PredictionOut {
    t: i64,
    label: Label,
    delay_probability: f64,
    tier: Tier,
}

#[derive(Serialize)]
struct SchemaOut {
    columns: Vec<String>,
    categories: BTreeMap<CategoricalField, Vec<String>>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(e: Error) -> ApiError {
    let status = match e {
        Error::InvalidHour(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// Body extraction failures keep axum's status (400/415/422) but use the
/// same `{"error": ...}` shape as engine errors.
fn rejection_error(rejection: JsonRejection) -> ApiError {
    (
        rejection.status(),
        Json(json!({ "error": rejection.body_text() })),
    )
}

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    predictor: Arc<Predictor>,
}

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<FlightQuery>, JsonRejection>,
) -> Result<Json<PredictionOut>, ApiError> {
    let Json(query) = payload.map_err(rejection_error)?;
    let result = state.predictor.predict(&query).map_err(api_error)?;
    Ok(Json(PredictionOut {
        t: chrono::Utc::now().timestamp_millis(),
        label: result.label,
        delay_probability: result.delay_probability,
        tier: result.tier,
    }))
}

async fn schema(State(state): State<AppState>) -> Json<SchemaOut> {
    let schema = state.predictor.schema();
    let categories = CategoricalField::ALL
        .into_iter()
        .map(|f| {
            let values = schema.categories(f).into_iter().map(String::from).collect();
            (f, values)
        })
        .collect();
    Json(SchemaOut {
        columns: schema.names().to_vec(),
        categories,
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(predictor: Arc<Predictor>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/schema", get(schema))
        .route("/health", get(health))
        .with_state(AppState { predictor })
}

pub async fn serve(predictor: Arc<Predictor>, port: u16) -> std::io::Result<()> {
    let app = router(predictor);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
