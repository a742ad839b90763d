use crate::types::EnvironmentalImpact;

/// kg of CO2 avoided per distance unit the new rider does not drive alone.
pub const CO2_KG_PER_DISTANCE: f64 = 0.12;

/// Liters of fuel saved per distance unit.
pub const FUEL_LITERS_PER_DISTANCE: f64 = 0.08;

pub fn estimate(new_rider_distance: f64) -> EnvironmentalImpact {
    EnvironmentalImpact {
        co2_reduction: round_to(new_rider_distance * CO2_KG_PER_DISTANCE, 3),
        fuel_saved: round_to(new_rider_distance * FUEL_LITERS_PER_DISTANCE, 2),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
