use thiserror::Error;

/// Failures reading or writing a persisted artifact blob.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("incompatible artifact: {0}")]
    Incompatible(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("historical dataset is empty")]
    EmptyDataset,
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },
    #[error("failed to fit decision tree: {0}")]
    Fit(String),
    #[error("failed to persist `{key}`: {source}")]
    Persist {
        key: &'static str,
        #[source]
        source: ArtifactError,
    },
    #[error("model worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}
