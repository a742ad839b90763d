use serde::{Deserialize, Serialize};

// ---------- Request types ----------

/// Body of a predict call. Distances default to 0 when absent; the
/// contextual fields are resolved by `features::ContextDefaults`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PredictRequest {
    pub original_distance: f64,
    pub distance_after_adding_rider: f64,
    pub new_rider_distance: f64,
    pub time_of_day: Option<f64>,        // 0..=23
    pub day_of_week: Option<f64>,        // 0=Monday .. 6=Sunday
    pub traffic_level: Option<f64>,      // 0.0 low .. 1.0 high
    pub weather_condition: Option<f64>,  // 0=clear, 1=rain, 2=snow, ...
}

/// One row submitted for retraining. The label is always derived, so any
/// `is_beneficial` key in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRecord {
    pub original_distance: f64,
    pub distance_after_adding_rider: f64,
    pub new_rider_distance: f64,
    #[serde(default)]
    pub time_of_day: Option<f64>,
    #[serde(default)]
    pub day_of_week: Option<f64>,
    #[serde(default)]
    pub traffic_level: Option<f64>,
    #[serde(default)]
    pub weather_condition: Option<f64>,
}

/// A fully resolved ride: every feature present, no defaults pending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideContext {
    pub original_distance: f64,
    pub distance_after_adding_rider: f64,
    pub new_rider_distance: f64,
    pub time_of_day: f64,
    pub day_of_week: f64,
    pub traffic_level: f64,
    pub weather_condition: f64,
}

// ---------- Response types ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub prediction_score: f64,
    pub add_rider: bool,
    pub efficiency: i64,
    pub fare_details: FareDetails,
    pub environmental_impact: EnvironmentalImpact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FareDetails {
    pub original_rider: OriginalRiderFare,
    pub new_rider: NewRiderFare,
    pub total_savings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OriginalRiderFare {
    pub original_fare: i64,
    pub new_fare: i64,
    pub savings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewRiderFare {
    pub direct_fare: i64,
    pub shared_fare: i64,
    pub savings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentalImpact {
    /// kg of CO2, 3 decimal places
    pub co2_reduction: f64,
    /// liters, 2 decimal places
    pub fuel_saved: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub message: String,
    pub data_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: &'static str,
}
