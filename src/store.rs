//! Lifecycle of the fitted (scaler, ensemble) pair.
//!
//! The store starts uninitialized and becomes ready through `ensure_ready`,
//! `train` or `retrain_with`; it never goes back. The pair is published as
//! one `Arc`, so a reader holds either the old or the new pair, never half of
//! each. Everything that fits a pair runs under the dataset lock, which
//! serializes retrains and makes concurrent first requests train only once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::artifacts::{self, ArtifactStore, MODEL_KEY, SCALER_KEY};
use crate::dataset::{HistoricalDataset, LabelRule};
use crate::error::{ArtifactError, ModelError};
use crate::features::N_FEATURES;
use crate::forest::{Forest, ForestParams, Vote};
use crate::scaler::StandardScaler;
use crate::types::RideContext;

/// A scaler and an ensemble fit on the same dataset snapshot.
#[derive(Debug)]
pub struct ModelPair {
    pub scaler: StandardScaler,
    pub forest: Forest,
    pub fit_id: u64,
}

impl ModelPair {
    /// Scale a raw feature vector and score it.
    pub fn score(&self, raw: &[f64]) -> Result<Vote, ModelError> {
        let scaled = self.scaler.transform_row(raw)?;
        self.forest.score(&scaled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
}

pub struct ModelStore {
    current: RwLock<Option<Arc<ModelPair>>>,
    dataset: Mutex<HistoricalDataset>,
    artifacts: Arc<dyn ArtifactStore>,
    params: ForestParams,
    training_passes: AtomicU64,
}

impl ModelStore {
    pub fn new(dataset: HistoricalDataset, artifacts: Arc<dyn ArtifactStore>, params: ForestParams) -> Self {
        Self {
            current: RwLock::new(None),
            dataset: Mutex::new(dataset),
            artifacts,
            params,
            training_passes: AtomicU64::new(0),
        }
    }

    /// Current pair, if any. The returned `Arc` stays valid across swaps.
    pub fn snapshot(&self) -> Option<Arc<ModelPair>> {
        self.current.read().clone()
    }

    pub fn status(&self) -> StoreStatus {
        let ready = self.current.read().is_some();
        StoreStatus {
            model_loaded: ready,
            scaler_loaded: ready,
        }
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.lock().len()
    }

    pub fn label_rule(&self) -> LabelRule {
        self.dataset.lock().rule()
    }

    /// Number of completed fits since construction.
    pub fn training_passes(&self) -> u64 {
        self.training_passes.load(Ordering::Relaxed)
    }

    /// Return the current pair, loading persisted artifacts or training a
    /// fresh pair if there is none yet.
    pub fn ensure_ready(&self) -> Result<Arc<ModelPair>, ModelError> {
        if let Some(pair) = self.snapshot() {
            return Ok(pair);
        }
        let dataset = self.dataset.lock();
        // another caller may have finished while we waited
        if let Some(pair) = self.snapshot() {
            return Ok(pair);
        }
        if let Some(pair) = self.load() {
            tracing::info!(fit_id = pair.fit_id, "loaded persisted model and scaler");
            return Ok(self.publish(pair));
        }
        tracing::info!("no usable persisted model; training a new one");
        self.fit_and_publish(&dataset)
    }

    /// Read both artifacts. Missing, unreadable or mismatched blobs all
    /// yield `None`.
    fn load(&self) -> Option<ModelPair> {
        match self.try_load() {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted artifacts");
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<ModelPair>, ArtifactError> {
        let (Some(model_bytes), Some(scaler_bytes)) =
            (self.artifacts.read(MODEL_KEY)?, self.artifacts.read(SCALER_KEY)?)
        else {
            return Ok(None);
        };
        let forest = artifacts::decode::<Forest>(&model_bytes)?;
        let scaler = artifacts::decode::<StandardScaler>(&scaler_bytes)?;
        if forest.fit_id != scaler.fit_id {
            return Err(ArtifactError::Incompatible(format!(
                "model fit {} does not match scaler fit {}",
                forest.fit_id, scaler.fit_id
            )));
        }
        if forest.payload.n_features() != N_FEATURES || scaler.payload.n_features() != N_FEATURES {
            return Err(ArtifactError::Incompatible(format!(
                "expected {N_FEATURES} features, model has {} and scaler has {}",
                forest.payload.n_features(),
                scaler.payload.n_features()
            )));
        }
        if forest.payload.n_trees() == 0 {
            return Err(ArtifactError::Incompatible("model has no trees".to_string()));
        }
        Ok(Some(ModelPair {
            scaler: scaler.payload,
            forest: forest.payload,
            fit_id: forest.fit_id,
        }))
    }

    /// Fit a fresh pair on the whole dataset, persist it and make it current.
    pub fn train(&self) -> Result<Arc<ModelPair>, ModelError> {
        let dataset = self.dataset.lock();
        self.fit_and_publish(&dataset)
    }

    /// Append rows and retrain. The rows are kept only if the new pair was
    /// fit and persisted. Returns the new dataset size.
    pub fn retrain_with(&self, rows: Vec<RideContext>) -> Result<usize, ModelError> {
        let mut dataset = self.dataset.lock();
        let added = rows.len();
        let mut candidate = dataset.clone();
        candidate.extend(rows);
        self.fit_and_publish(&candidate)?;
        *dataset = candidate;
        tracing::info!(added, total = dataset.len(), "retrained with new records");
        Ok(dataset.len())
    }

    /// Swap the label rule, relabel the whole history and retrain.
    pub fn relabel(&self, rule: LabelRule) -> Result<Arc<ModelPair>, ModelError> {
        let mut dataset = self.dataset.lock();
        let mut candidate = dataset.clone();
        candidate.set_rule(rule);
        let pair = self.fit_and_publish(&candidate)?;
        *dataset = candidate;
        tracing::info!(?rule, "relabeled dataset");
        Ok(pair)
    }

    fn fit_and_publish(&self, dataset: &HistoricalDataset) -> Result<Arc<ModelPair>, ModelError> {
        let pair = fit_pair(dataset, &self.params)?;
        self.persist(&pair)?;
        self.training_passes.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            rows = dataset.len(),
            trees = pair.forest.n_trees(),
            fit_id = pair.fit_id,
            "model trained and saved"
        );
        Ok(self.publish(pair))
    }

    fn persist(&self, pair: &ModelPair) -> Result<(), ModelError> {
        artifacts::encode(pair.fit_id, &pair.forest)
            .and_then(|bytes| self.artifacts.write(MODEL_KEY, &bytes))
            .map_err(|source| ModelError::Persist { key: MODEL_KEY, source })?;
        artifacts::encode(pair.fit_id, &pair.scaler)
            .and_then(|bytes| self.artifacts.write(SCALER_KEY, &bytes))
            .map_err(|source| ModelError::Persist { key: SCALER_KEY, source })
    }

    fn publish(&self, pair: ModelPair) -> Arc<ModelPair> {
        let pair = Arc::new(pair);
        *self.current.write() = Some(Arc::clone(&pair));
        pair
    }
}

fn fit_pair(dataset: &HistoricalDataset, params: &ForestParams) -> Result<ModelPair, ModelError> {
    if dataset.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    let (x, y) = dataset.training_data();
    let scaler = StandardScaler::fit(&x)?;
    let scaled = scaler.transform(&x)?;
    let forest = Forest::fit(&scaled, &y, params)?;
    Ok(ModelPair {
        scaler,
        forest,
        fit_id: rand::random(),
    })
}
