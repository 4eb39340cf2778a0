//! Word-level n-gram language model for lyrics generation.
//!
//! This crate provides the whole modelling pipeline:
//! - Tokenization of raw documents into normalized words
//! - An n-gram table of orders 1 to 3 (counting, lookup, statistics)
//! - A line-oriented text model format plus a compact binary snapshot
//! - Generation by weighted sampling with deterministic backoff
//! - Corpus training from a directory of plain-text documents
//! - A shared model store with atomic replacement for serving layers
//!
//! ```no_run
//! use lyrigen_core::model::generator::Generator;
//! use lyrigen_core::model::prediction_input::{PredictionInput, StartSeed};
//! use lyrigen_core::trainer::{Trainer, TrainerConfig};
//!
//! # fn main() -> lyrigen_core::Result<()> {
//! let outcome = Trainer::new(TrainerConfig::default())?.train_directory("data")?;
//! outcome.model.save("all_grams.tsv")?;
//!
//! let input = PredictionInput::new(20, StartSeed::Custom("i was".to_owned()));
//! let generation = Generator::new(&outcome.model).generate(&input)?;
//! println!("{}", generation.full_text());
//! # Ok(())
//! # }
//! ```

/// Crate-wide error type and result alias.
pub mod error;

/// Normalization of raw text into word tokens.
pub mod tokenizer;

/// N-gram table, model formats, sampling and generation.
pub mod model;

/// Corpus ingestion into a model.
pub mod trainer;

/// Document sources feeding the trainer (directory listing, in-memory).
pub mod corpus;

/// I/O utilities (path helpers, model file dispatch).
pub mod io;

pub use error::{LyrigenError, Result};
pub use model::MAX_ORDER;
