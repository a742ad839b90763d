use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::features::{feature_vector, N_FEATURES};
use crate::pricing::detour_ratio;
use crate::types::RideContext;

/// Rule deriving `is_beneficial` from a row's distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    /// Rows with `distance_ratio` strictly below this are candidates.
    pub max_distance_ratio: f64,
    /// ...and the new rider must travel strictly further than this.
    pub min_new_rider_distance: f64,
}

impl Default for LabelRule {
    fn default() -> Self {
        Self {
            max_distance_ratio: 0.3,
            min_new_rider_distance: 2.0,
        }
    }
}

impl LabelRule {
    pub fn is_beneficial(&self, row: &RideContext) -> bool {
        distance_ratio(row) < self.max_distance_ratio
            && row.new_rider_distance > self.min_new_rider_distance
    }
}

pub fn additional_distance(row: &RideContext) -> f64 {
    row.distance_after_adding_rider - row.original_distance
}

pub fn distance_ratio(row: &RideContext) -> f64 {
    detour_ratio(
        row.original_distance,
        row.distance_after_adding_rider,
        row.new_rider_distance,
    )
}

/// Provider of the initial historical rows.
pub trait SeedSource {
    fn seed_rows(&self) -> Vec<RideContext>;
}

/// Uniformly sampled rides over plausible city-trip ranges.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSeed {
    pub rows: usize,
    /// `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SyntheticSeed {
    fn default() -> Self {
        Self {
            rows: 1000,
            rng_seed: None,
        }
    }
}

impl SeedSource for SyntheticSeed {
    fn seed_rows(&self) -> Vec<RideContext> {
        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..self.rows)
            .map(|_| RideContext {
                original_distance: rng.gen_range(1.0..20.0),
                distance_after_adding_rider: rng.gen_range(1.0..30.0),
                new_rider_distance: rng.gen_range(1.0..15.0),
                time_of_day: rng.gen_range(0..24) as f64,
                day_of_week: rng.gen_range(0..7) as f64,
                traffic_level: rng.gen_range(0.0..1.0),
                weather_condition: rng.gen_range(0..5) as f64,
            })
            .collect()
    }
}

/// Append-only ride history. Labels are never stored; they are derived from
/// the current rule every time training data is materialized.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    rows: Vec<RideContext>,
    rule: LabelRule,
}

impl HistoricalDataset {
    pub fn new(rows: Vec<RideContext>, rule: LabelRule) -> Self {
        Self { rows, rule }
    }

    pub fn seeded(source: &dyn SeedSource, rule: LabelRule) -> Self {
        Self::new(source.seed_rows(), rule)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RideContext] {
        &self.rows
    }

    pub fn rule(&self) -> LabelRule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: LabelRule) {
        self.rule = rule;
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = RideContext>) {
        self.rows.extend(rows);
    }

    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(|r| self.rule.is_beneficial(r)).collect()
    }

    /// Raw feature matrix (rows x `N_FEATURES`) and 0/1 labels.
    pub fn training_data(&self) -> (Array2<f64>, Array1<usize>) {
        let mut x = Array2::zeros((self.rows.len(), N_FEATURES));
        for (mut out, row) in x.rows_mut().into_iter().zip(&self.rows) {
            out.assign(&Array1::from(feature_vector(row).to_vec()));
        }
        let y = self
            .rows
            .iter()
            .map(|r| usize::from(self.rule.is_beneficial(r)))
            .collect();
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(original: f64, after: f64, new_rider: f64) -> RideContext {
        RideContext {
            original_distance: original,
            distance_after_adding_rider: after,
            new_rider_distance: new_rider,
            time_of_day: 8.0,
            day_of_week: 1.0,
            traffic_level: 0.5,
            weather_condition: 0.0,
        }
    }

    #[test]
    fn label_requires_short_detour_and_long_enough_trip() {
        let rule = LabelRule::default();
        assert!(rule.is_beneficial(&ride(10.0, 11.0, 5.0)));
        // ratio 0.4
        assert!(!rule.is_beneficial(&ride(10.0, 12.0, 5.0)));
        // exactly 2 is not "more than 2"
        assert!(!rule.is_beneficial(&ride(10.0, 10.0, 2.0)));
        assert!(!rule.is_beneficial(&ride(10.0, 10.0, 0.0)));
    }

    #[test]
    fn derived_columns() {
        let row = ride(10.0, 12.0, 5.0);
        assert_eq!(additional_distance(&row), 2.0);
        assert!((distance_ratio(&row) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn changing_the_rule_relabels_every_row() {
        let mut data = HistoricalDataset::new(
            vec![ride(10.0, 11.0, 5.0), ride(10.0, 12.0, 5.0)],
            LabelRule::default(),
        );
        assert_eq!(data.labels(), vec![true, false]);
        data.set_rule(LabelRule {
            max_distance_ratio: 0.5,
            ..LabelRule::default()
        });
        assert_eq!(data.labels(), vec![true, true]);
    }

    #[test]
    fn training_matrix_keeps_column_order() {
        let data = HistoricalDataset::new(vec![ride(1.0, 2.0, 3.0)], LabelRule::default());
        let (x, y) = data.training_data();
        assert_eq!(x.shape(), &[1, N_FEATURES]);
        assert_eq!(x.row(0).to_vec(), vec![1.0, 2.0, 3.0, 8.0, 1.0, 0.5, 0.0]);
        assert_eq!(y.to_vec(), vec![0]);
    }

    #[test]
    fn synthetic_seed_is_reproducible_and_in_range() {
        let seed = SyntheticSeed {
            rows: 300,
            rng_seed: Some(5),
        };
        let rows = seed.seed_rows();
        assert_eq!(rows.len(), 300);
        assert_eq!(rows, seed.seed_rows());
        for r in &rows {
            assert!((1.0..20.0).contains(&r.original_distance));
            assert!((1.0..30.0).contains(&r.distance_after_adding_rider));
            assert!((1.0..15.0).contains(&r.new_rider_distance));
            assert!((0.0..=23.0).contains(&r.time_of_day));
            assert!((0.0..=6.0).contains(&r.day_of_week));
            assert!((0.0..1.0).contains(&r.traffic_level));
            assert!((0.0..=4.0).contains(&r.weather_condition));
        }
        let data = HistoricalDataset::seeded(&seed, LabelRule::default());
        let labels = data.labels();
        assert!(labels.iter().any(|b| *b) && labels.iter().any(|b| !*b));
    }
}
