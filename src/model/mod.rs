//! The rating engine.
//!
//! Flow of a recompute: the [`orchestrator`] loads sets and ratings from a store,
//! the [`aggregator`] combines one [`match_rating`] sample per qualifying set, and
//! [`rating_utils`] holds the underlying formulas. [`replay`] rebuilds everything
//! from raw set data without a store.
pub mod aggregator;
pub mod constants;
pub mod error;
pub mod match_rating;
pub mod orchestrator;
pub mod predictor;
pub mod rating_lookup;
pub mod rating_utils;
pub mod recompute;
pub mod replay;
pub mod structures;
pub mod teams;
