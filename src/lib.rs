//! Decides whether detouring an in-progress ride to pick up another rider is
//! worthwhile, and prices the pooled trip.
//!
//! A bagged decision-tree classifier, kept by [`store::ModelStore`], gives a
//! risk signal; [`pricing`] and [`environment`] compute the fare split and
//! the impact report from raw distances. [`predictor::Predictor`] merges the
//! two and [`server`] exposes them over HTTP.

pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod environment;
pub mod error;
pub mod features;
pub mod forest;
pub mod predictor;
pub mod pricing;
pub mod scaler;
pub mod server;
pub mod store;
pub mod types;
