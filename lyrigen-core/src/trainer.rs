use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::corpus::{DirectorySource, DocumentSource};
use crate::error::{LyrigenError, Result};
use crate::model::MAX_ORDER;
use crate::model::multigram_model::{ModelStats, MultiGramModel};
use crate::tokenizer::{Tokenizer, TokenizerConfig};

/// Configuration of a training run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrainerConfig {
	/// Highest n-gram order to count, `1..=3`.
	pub max_order: usize,
	/// Only read files with this extension (directory sources).
	pub extension: Option<String>,
	/// Text cleaning options.
	pub tokenizer: TokenizerConfig,
}

impl Default for TrainerConfig {
	fn default() -> Self {
		Self { max_order: MAX_ORDER, extension: None, tokenizer: TokenizerConfig::default() }
	}
}

impl TrainerConfig {
	/// Returns a builder initialised with [`TrainerConfig::default`].
	#[must_use]
	pub fn builder() -> TrainerBuilder {
		TrainerBuilder::default()
	}

	/// Validates the configuration.
	pub fn validate(&self) -> Result<()> {
		if !(1..=MAX_ORDER).contains(&self.max_order) {
			return Err(LyrigenError::InvalidOrder(self.max_order));
		}
		Ok(())
	}
}

/// Builder for [`TrainerConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrainerBuilder {
	config: TrainerConfig,
}

impl TrainerBuilder {
	/// Sets the highest order.
	#[must_use]
	pub fn max_order(mut self, max_order: usize) -> Self {
		self.config.max_order = max_order;
		self
	}

	/// Restricts directory sources to one file extension.
	#[must_use]
	pub fn extension(mut self, extension: impl Into<String>) -> Self {
		self.config.extension = Some(extension.into());
		self
	}

	/// Sets the tokenizer options.
	#[must_use]
	pub fn tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
		self.config.tokenizer = tokenizer;
		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<TrainerConfig> {
		self.config.validate()?;
		Ok(self.config)
	}
}

/// A document that could not be used.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentFailure {
	/// Document identifier (file name for directories).
	pub id: String,
	/// Why it was skipped.
	pub reason: String,
}

/// Report of a training run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrainingSummary {
	/// Candidate documents listed by the source.
	pub documents_found: usize,
	/// Documents read and counted.
	pub documents_loaded: usize,
	/// Documents skipped, with the reason.
	pub failures: Vec<DocumentFailure>,
	/// Tokens fed to the table.
	pub tokens: usize,
	/// Resulting model figures.
	pub stats: ModelStats,
}

impl fmt::Display for TrainingSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "documents:  {} found, {} loaded, {} skipped", self.documents_found, self.documents_loaded, self.failures.len())?;
		writeln!(f, "tokens:     {}", self.tokens)?;
		write!(f, "{}", self.stats)
	}
}

/// Trained model together with its report.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
	/// The populated model.
	pub model: MultiGramModel,
	/// What happened during the run.
	pub summary: TrainingSummary,
}

/// Builds a [`MultiGramModel`] from a corpus.
///
/// Each document is tokenized and observed on its own, so n-grams never
/// span two documents. A document that cannot be read is logged and
/// skipped; the run only fails when nothing at all could be read.
#[derive(Debug, Clone)]
pub struct Trainer {
	config: TrainerConfig,
	tokenizer: Tokenizer,
}

impl Trainer {
	/// Creates a trainer.
	///
	/// # Errors
	/// [`LyrigenError::InvalidOrder`] if the configured order is out of range.
	pub fn new(config: TrainerConfig) -> Result<Self> {
		config.validate()?;
		let tokenizer = Tokenizer::new(config.tokenizer.clone());
		Ok(Self { config, tokenizer })
	}

	/// Configuration of this trainer.
	pub fn config(&self) -> &TrainerConfig {
		&self.config
	}

	/// Trains on the plain-text files directly inside `dir`.
	///
	/// # Errors
	/// - [`LyrigenError::InputNotFound`] if `dir` does not exist
	/// - [`LyrigenError::EmptyCorpus`] if no document could be read
	pub fn train_directory<P: AsRef<Path>>(&self, dir: P) -> Result<TrainingOutcome> {
		let source = DirectorySource::new(dir, self.config.extension.clone())?;
		self.train_source(&source)
	}

	/// Trains on every document of `source`.
	pub fn train_source<S: DocumentSource + ?Sized>(&self, source: &S) -> Result<TrainingOutcome> {
		let ids = source.list()?;
		let mut model = MultiGramModel::new(self.config.max_order)?;
		let mut failures = Vec::new();
		let mut loaded = 0;
		let mut tokens_seen = 0;

		for id in &ids {
			match source.read(id) {
				Ok(text) => {
					let tokens = self.tokenizer.tokenize(&text);
					debug!("{id}: {} tokens", tokens.len());
					tokens_seen += tokens.len();
					model.observe(&tokens);
					loaded += 1;
				}
				Err(err) => {
					warn!("skipping {id}: {err}");
					failures.push(DocumentFailure { id: id.clone(), reason: err.to_string() });
				}
			}
		}

		if loaded == 0 {
			return Err(LyrigenError::EmptyCorpus { dir: source.location(), found: ids.len() });
		}

		let summary = TrainingSummary {
			documents_found: ids.len(),
			documents_loaded: loaded,
			failures,
			tokens: tokens_seen,
			stats: model.stats(),
		};
		info!(
			"trained order-{} model on {}/{} documents, vocabulary {}",
			self.config.max_order, loaded, ids.len(), summary.stats.vocabulary
		);
		Ok(TrainingOutcome { model, summary })
	}
}
