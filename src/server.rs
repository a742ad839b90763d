use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{fmt::Display, sync::Arc};

use crate::error::ModelError;
use crate::predictor::Predictor;
use crate::types::{
    ErrorResponse, HealthResponse, PredictRequest, PredictionResult, TrainResponse, TrainingRecord,
};

// ---------- Server state ----------

const PREDICT_FAILED: &str = "Failed to make prediction";
const TRAIN_FAILED: &str = "Failed to train model";

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/train", post(train))
        .route("/health", get(health))
        .with_state(state)
}

// ---------- Error envelope ----------

/// Uniform `{error, message}` failure envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Display, message: &'static str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                message,
            },
        }
    }

    fn rejected(rejection: JsonRejection, message: &'static str) -> Self {
        // keep axum's 400/415/422 split for bad bodies
        Self::new(rejection.status(), rejection.body_text(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ---------- Handlers ----------

/// Run synchronous model work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ModelError>
where
    F: FnOnce() -> Result<T, ModelError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ModelError::Worker(e.to_string()))?
}

pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(req) = body.map_err(|r| {
        tracing::error!(error = %r.body_text(), "rejected prediction request");
        ApiError::rejected(r, PREDICT_FAILED)
    })?;
    tracing::info!(?req, "received prediction request");

    // fitting on a cold start can take a while; keep it off the runtime threads
    let predictor = Arc::clone(&state.predictor);
    let result = blocking(move || predictor.predict(&req)).await.map_err(|e| {
        tracing::error!(error = %e, "error making prediction");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e, PREDICT_FAILED)
    })?;

    tracing::info!(?result, "prediction result");
    Ok(Json(result))
}

pub async fn train(
    State(state): State<AppState>,
    body: Result<Json<Vec<TrainingRecord>>, JsonRejection>,
) -> Result<Json<TrainResponse>, ApiError> {
    let Json(records) = body.map_err(|r| {
        tracing::error!(error = %r.body_text(), "rejected training request");
        ApiError::rejected(r, TRAIN_FAILED)
    })?;
    tracing::info!("received training request with {} records", records.len());

    let predictor = Arc::clone(&state.predictor);
    let data_size = blocking(move || predictor.train(&records)).await.map_err(|e| {
        tracing::error!(error = %e, "error training model");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e, TRAIN_FAILED)
    })?;

    Ok(Json(TrainResponse {
        success: true,
        message: "Model trained successfully".to_string(),
        data_size,
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.predictor.store().status();
    Json(HealthResponse {
        status: "healthy",
        model_loaded: status.model_loaded,
        scaler_loaded: status.scaler_loaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactStore, MemoryArtifactStore};
    use crate::dataset::{HistoricalDataset, LabelRule, SyntheticSeed};
    use crate::error::ArtifactError;
    use crate::features::ContextDefaults;
    use crate::forest::ForestParams;
    use crate::store::ModelStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state_with(artifacts: Arc<dyn ArtifactStore>) -> AppState {
        let seed = SyntheticSeed {
            rows: 100,
            rng_seed: Some(8),
        };
        let store = ModelStore::new(
            HistoricalDataset::seeded(&seed, LabelRule::default()),
            artifacts,
            ForestParams { n_trees: 5, seed: 42 },
        );
        AppState {
            predictor: Arc::new(Predictor::new(Arc::new(store), ContextDefaults::default())),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_reflects_store_state() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let Json(before) = health(State(state.clone())).await;
        assert_eq!(before.status, "healthy");
        assert!(!before.model_loaded && !before.scaler_loaded);

        let req = PredictRequest {
            original_distance: 4.0,
            distance_after_adding_rider: 4.5,
            new_rider_distance: 3.0,
            ..Default::default()
        };
        predict(State(state.clone()), Ok(Json(req))).await.expect("predict");

        let Json(after) = health(State(state)).await;
        assert!(after.model_loaded && after.scaler_loaded);
    }

    #[tokio::test]
    async fn train_reports_new_size() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let records: Vec<TrainingRecord> = (0..50)
            .map(|i| TrainingRecord {
                original_distance: 5.0 + i as f64 * 0.1,
                distance_after_adding_rider: 6.0,
                new_rider_distance: 3.0,
                time_of_day: None,
                day_of_week: Some(2.0),
                traffic_level: None,
                weather_condition: None,
            })
            .collect();
        let Json(out) = train(State(state.clone()), Ok(Json(records))).await.expect("train");
        assert!(out.success);
        assert_eq!(out.data_size, 150);

        let Json(h) = health(State(state)).await;
        assert!(h.model_loaded);
    }

    async fn post_json(state: AppState, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        router(state).oneshot(request).await.expect("response")
    }

    #[tokio::test]
    async fn wrong_type_in_predict_body_is_rejected() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let response = post_json(state.clone(), "/predict", r#"{"original_distance":"x"}"#).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["message"], PREDICT_FAILED);
        assert!(body["error"].as_str().expect("error text").contains("original_distance"));
        // nothing was trained for a rejected body
        assert!(!state.predictor.store().status().model_loaded);
    }

    #[tokio::test]
    async fn training_record_without_distances_is_rejected() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let response = post_json(state.clone(), "/train", r#"[{"original_distance":1}]"#).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["message"], TRAIN_FAILED);
        assert!(body["error"].as_str().expect("error text").contains("distance_after_adding_rider"));
        assert_eq!(state.predictor.store().dataset_len(), 100);
    }

    #[tokio::test]
    async fn unparseable_json_is_rejected() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let response = post_json(state, "/predict", "{ original_distance: ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], PREDICT_FAILED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn routes_serve_predict_and_health() {
        let state = state_with(Arc::new(MemoryArtifactStore::new()));
        let response = post_json(
            state.clone(),
            "/predict",
            r#"{"original_distance":10,"distance_after_adding_rider":12,"new_rider_distance":5}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["efficiency"], 60);
        assert_eq!(body["fare_details"]["total_savings"], 16);

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let response = router(state).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["scaler_loaded"], true);
    }

    #[tokio::test]
    async fn internal_failure_becomes_error_envelope() {
        struct Broken;
        impl ArtifactStore for Broken {
            fn read(&self, _: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
                Err(std::io::Error::other("disk gone").into())
            }
            fn write(&self, _: &str, _: &[u8]) -> Result<(), ArtifactError> {
                Err(std::io::Error::other("disk gone").into())
            }
        }
        let state = state_with(Arc::new(Broken));
        let err = predict(State(state.clone()), Ok(Json(PredictRequest::default())))
            .await
            .expect_err("persist fails");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], PREDICT_FAILED);
        assert!(body["error"].as_str().expect("error text").contains("disk gone"));

        let err = train(State(state), Ok(Json(Vec::new()))).await.expect_err("train fails");
        let body = body_json(err.into_response()).await;
        assert_eq!(body["message"], TRAIN_FAILED);
    }
}
