use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::environment;
use crate::error::ModelError;
use crate::features::{feature_vector, ContextDefaults, FEATURE_NAMES};
use crate::pricing;
use crate::store::ModelStore;
use crate::types::{PredictRequest, PredictionResult, RideContext, TrainingRecord};

/// Turns a ride request into one scored, priced result.
pub struct Predictor {
    store: Arc<ModelStore>,
    defaults: ContextDefaults,
    log_features: bool,
}

impl Predictor {
    pub fn new(store: Arc<ModelStore>, defaults: ContextDefaults) -> Self {
        Self {
            store,
            defaults,
            log_features: std::env::var("LOG_PRED").ok().as_deref() == Some("1"),
        }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn predict(&self, req: &PredictRequest) -> Result<PredictionResult, ModelError> {
        self.predict_at(req, Local::now().naive_local())
    }

    /// Like `predict`, with `now` standing in for the wall clock.
    pub fn predict_at(&self, req: &PredictRequest, now: NaiveDateTime) -> Result<PredictionResult, ModelError> {
        let ctx = self.defaults.resolve_request(req, now);
        let raw = feature_vector(&ctx);
        if self.log_features {
            let sample: Vec<String> = FEATURE_NAMES
                .iter()
                .zip(raw)
                .map(|(name, v)| format!("{name}={v:.3}"))
                .collect();
            tracing::info!("scoring [{}]", sample.join(", "));
        } else {
            tracing::debug!(?raw, "scoring");
        }

        let pair = self.store.ensure_ready()?;
        let vote = pair.score(&raw)?;
        Ok(assemble(&ctx, vote.probability, vote.beneficial))
    }

    /// Resolve submitted rows against the current clock and retrain.
    pub fn train(&self, records: &[TrainingRecord]) -> Result<usize, ModelError> {
        let now = Local::now().naive_local();
        let rows = records
            .iter()
            .map(|r| self.defaults.resolve_record(r, now))
            .collect();
        self.store.retrain_with(rows)
    }
}

fn assemble(ctx: &RideContext, score: f64, add_rider: bool) -> PredictionResult {
    let allocation = pricing::allocate(
        ctx.original_distance,
        ctx.distance_after_adding_rider,
        ctx.new_rider_distance,
    );
    PredictionResult {
        prediction_score: score,
        add_rider,
        efficiency: allocation.efficiency_score(),
        fare_details: allocation.fare_details(),
        environmental_impact: environment::estimate(ctx.new_rider_distance),
    }
}
