//! N-gram table, model formats, sampling and generation.
//!
//! - Per-context continuation counts (`State`)
//! - Fixed-order tables (`NGramModel`)
//! - The full model of orders 1 to `max_order` (`MultiGramModel`)
//! - Text and binary model formats (`codec`)
//! - Weighted sampling (`WeightedSampler`) and backoff generation (`Generator`)
//! - Atomically replaceable shared model (`ModelStore`)

/// Highest supported n-gram order.
pub const MAX_ORDER: usize = 3;

/// Backoff text generation over a loaded model.
pub mod generator;

/// The n-gram table of every order, with vocabulary and statistics.
pub mod multigram_model;

/// Counts of a single order, keyed by context.
pub mod ngram_model;

/// Continuation counts of one context.
pub mod state;

/// Exact proportional sampling over continuation counts.
pub mod sampler;

/// Generation parameters.
pub mod prediction_input;

/// Shared, versioned model handle for serving layers.
pub mod store;

/// Text format and binary snapshot.
mod codec;
