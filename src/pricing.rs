//! Fare split for a pooled ride.
//!
//! All amounts are in currency units and derived from distances only; the
//! classifier's opinion never enters here.

use crate::types::{FareDetails, NewRiderFare, OriginalRiderFare};

/// Base fare in currency units.
pub const BASE_FARE: f64 = 10.0;

/// Rate per distance unit in currency units.
pub const PER_DISTANCE_RATE: f64 = 2.0;

/// Share of the solo fare the original rider still pays once pooled.
pub const ORIGINAL_RIDER_SHARE: f64 = 0.7;

/// Share of the base fare the new rider pays.
pub const NEW_RIDER_BASE_SHARE: f64 = 0.5;

/// Share of the distance-based rate the new rider pays.
pub const NEW_RIDER_DISTANCE_SHARE: f64 = 0.8;

/// Detour per unit of the new rider's own trip. A non-positive trip length
/// yields `+inf`.
pub fn detour_ratio(original: f64, after_adding: f64, new_rider: f64) -> f64 {
    if new_rider > 0.0 {
        (after_adding - original) / new_rider
    } else {
        f64::INFINITY
    }
}

/// Unrounded allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub original_fare: f64,
    pub original_rider_new_fare: f64,
    pub new_rider_direct_fare: f64,
    pub new_rider_fare: f64,
    pub original_rider_savings: f64,
    pub new_rider_savings: f64,
    pub total_savings: f64,
    pub additional_distance: f64,
    pub distance_ratio: f64,
    /// Percentage in `[0, 100]`.
    pub efficiency: f64,
}

pub fn allocate(original_distance: f64, distance_after_adding_rider: f64, new_rider_distance: f64) -> Allocation {
    let original_fare = BASE_FARE + original_distance * PER_DISTANCE_RATE;
    let new_rider_direct_fare = BASE_FARE + new_rider_distance * PER_DISTANCE_RATE;

    let original_rider_new_fare = original_fare * ORIGINAL_RIDER_SHARE;
    let new_rider_fare = BASE_FARE * NEW_RIDER_BASE_SHARE
        + new_rider_distance * PER_DISTANCE_RATE * NEW_RIDER_DISTANCE_SHARE;

    let original_rider_savings = original_fare - original_rider_new_fare;
    let new_rider_savings = new_rider_direct_fare - new_rider_fare;

    let distance_ratio = detour_ratio(original_distance, distance_after_adding_rider, new_rider_distance);
    // A shorter shared route (negative detour) caps at 100.
    let efficiency = (100.0 - distance_ratio * 100.0).clamp(0.0, 100.0);

    Allocation {
        original_fare,
        original_rider_new_fare,
        new_rider_direct_fare,
        new_rider_fare,
        original_rider_savings,
        new_rider_savings,
        total_savings: original_rider_savings + new_rider_savings,
        additional_distance: distance_after_adding_rider - original_distance,
        distance_ratio,
        efficiency,
    }
}

/// Round half to even, matching the reporting convention of the fare sheet.
fn whole(amount: f64) -> i64 {
    amount.round_ties_even() as i64
}

impl Allocation {
    pub fn efficiency_score(&self) -> i64 {
        whole(self.efficiency)
    }

    /// Whole-unit fare sheet. Each figure, the total included, is rounded
    /// from its exact value.
    pub fn fare_details(&self) -> FareDetails {
        let original_rider = OriginalRiderFare {
            original_fare: whole(self.original_fare),
            new_fare: whole(self.original_rider_new_fare),
            savings: whole(self.original_rider_savings),
        };
        let new_rider = NewRiderFare {
            direct_fare: whole(self.new_rider_direct_fare),
            shared_fare: whole(self.new_rider_fare),
            savings: whole(self.new_rider_savings),
        };
        FareDetails {
            original_rider,
            new_rider,
            total_savings: whole(self.total_savings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example() {
        let a = allocate(10.0, 12.0, 5.0);
        assert_eq!(a.additional_distance, 2.0);
        assert!((a.distance_ratio - 0.4).abs() < 1e-12);
        assert_eq!(a.efficiency_score(), 60);

        let fares = a.fare_details();
        assert_eq!(fares.original_rider.original_fare, 30);
        assert_eq!(fares.original_rider.new_fare, 21);
        assert_eq!(fares.original_rider.savings, 9);
        assert_eq!(fares.new_rider.direct_fare, 20);
        assert_eq!(fares.new_rider.shared_fare, 13);
        assert_eq!(fares.new_rider.savings, 7);
        assert_eq!(fares.total_savings, 16);
    }

    #[test]
    fn zero_new_rider_distance_is_infinite_ratio() {
        let a = allocate(10.0, 14.0, 0.0);
        assert!(a.distance_ratio.is_infinite() && a.distance_ratio > 0.0);
        assert_eq!(a.efficiency, 0.0);
        assert_eq!(a.efficiency_score(), 0);
        // direct fare is just the base
        assert_eq!(a.fare_details().new_rider.direct_fare, 10);
    }

    #[test]
    fn efficiency_stays_in_bounds() {
        let distances = [0.0, 0.5, 1.0, 2.5, 7.0, 13.3, 40.0];
        for &o in &distances {
            for &d in &distances {
                for &n in &distances {
                    let a = allocate(o, d, n);
                    assert!((0.0..=100.0).contains(&a.efficiency), "{o} {d} {n}");
                    assert!((0..=100).contains(&a.efficiency_score()));
                }
            }
        }
    }

    #[test]
    fn savings_add_up() {
        for (o, d, n) in [(3.25, 4.0, 1.25), (0.0, 0.0, 0.0), (17.75, 21.1, 9.9), (1.25, 1.0, 3.75)] {
            let a = allocate(o, d, n);
            assert_eq!(a.total_savings, a.original_rider_savings + a.new_rider_savings);
            assert_eq!(a.fare_details().total_savings, whole(a.total_savings));
        }
    }

    #[test]
    fn total_is_rounded_from_exact_savings() {
        // 3.4 + 5.4 = 8.8: rounding each part first would report 8
        let a = allocate(2.0 / 3.0, 1.0, 1.0);
        assert!((a.total_savings - 8.8).abs() < 1e-9);
        let f = a.fare_details();
        assert_eq!(f.original_rider.savings, 3);
        assert_eq!(f.new_rider.savings, 5);
        assert_eq!(f.total_savings, 9);
    }

    #[test]
    fn no_detour_is_fully_efficient() {
        assert_eq!(allocate(8.0, 8.0, 4.0).efficiency_score(), 100);
        assert_eq!(allocate(8.0, 6.0, 4.0).efficiency_score(), 100);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(whole(2.5), 2);
        assert_eq!(whole(3.5), 4);
        assert_eq!(whole(-0.4), 0);
    }
}
