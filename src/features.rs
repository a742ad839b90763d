use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::types::{PredictRequest, RideContext, TrainingRecord};

/// Authoritative input order for the scaler and the ensemble.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "original_distance",
    "distance_after_adding_rider",
    "new_rider_distance",
    "time_of_day",
    "day_of_week",
    "traffic_level",
    "weather_condition",
];

pub const N_FEATURES: usize = 7;

pub const DEFAULT_TRAFFIC_LEVEL: f64 = 0.5;
pub const DEFAULT_WEATHER_CONDITION: f64 = 0.0;

/// Map a resolved ride onto the fixed feature order. Values pass through
/// unchanged, including negative or out-of-range ones.
pub fn feature_vector(ctx: &RideContext) -> [f64; N_FEATURES] {
    [
        ctx.original_distance,
        ctx.distance_after_adding_rider,
        ctx.new_rider_distance,
        ctx.time_of_day,
        ctx.day_of_week,
        ctx.traffic_level,
        ctx.weather_condition,
    ]
}

/// Rough congestion curve by hour of day.
pub fn estimate_traffic_level(hour: f64) -> f64 {
    if (7.0..=9.0).contains(&hour) {
        // morning rush
        0.8
    } else if (16.0..=19.0).contains(&hour) {
        // evening rush
        0.9
    } else if hour >= 23.0 || hour <= 5.0 {
        0.2
    } else {
        DEFAULT_TRAFFIC_LEVEL
    }
}

/// Fills in contextual fields a caller left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextDefaults {
    /// Estimate a missing `traffic_level` from the hour instead of using
    /// `DEFAULT_TRAFFIC_LEVEL`.
    pub estimate_traffic: bool,
}

impl ContextDefaults {
    pub fn resolve_request(&self, req: &PredictRequest, now: NaiveDateTime) -> RideContext {
        self.resolve(
            [
                req.original_distance,
                req.distance_after_adding_rider,
                req.new_rider_distance,
            ],
            [
                req.time_of_day,
                req.day_of_week,
                req.traffic_level,
                req.weather_condition,
            ],
            now,
        )
    }

    pub fn resolve_record(&self, rec: &TrainingRecord, now: NaiveDateTime) -> RideContext {
        self.resolve(
            [
                rec.original_distance,
                rec.distance_after_adding_rider,
                rec.new_rider_distance,
            ],
            [
                rec.time_of_day,
                rec.day_of_week,
                rec.traffic_level,
                rec.weather_condition,
            ],
            now,
        )
    }

    fn resolve(
        &self,
        [original, after, new_rider]: [f64; 3],
        [hour, day, traffic, weather]: [Option<f64>; 4],
        now: NaiveDateTime,
    ) -> RideContext {
        let time_of_day = hour.unwrap_or(now.hour() as f64);
        let traffic_level = traffic.unwrap_or_else(|| {
            if self.estimate_traffic {
                estimate_traffic_level(time_of_day)
            } else {
                DEFAULT_TRAFFIC_LEVEL
            }
        });
        RideContext {
            original_distance: original,
            distance_after_adding_rider: after,
            new_rider_distance: new_rider,
            time_of_day,
            day_of_week: day.unwrap_or(now.weekday().num_days_from_monday() as f64),
            traffic_level,
            weather_condition: weather.unwrap_or(DEFAULT_WEATHER_CONDITION),
        }
    }
}
