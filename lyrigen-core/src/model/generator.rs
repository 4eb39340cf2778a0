use log::{debug, warn};
use rand::Rng;

use super::MAX_ORDER;
use super::multigram_model::MultiGramModel;
use super::prediction_input::{PredictionInput, StartSeed};
use crate::error::{LyrigenError, Result};
use crate::tokenizer::Tokenizer;

/// Result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
	/// Seed words kept after vocabulary validation.
	pub seed: Vec<String>,
	/// Generated tokens, exactly the requested length.
	pub tokens: Vec<String>,
	/// Order used for each generated token.
	pub orders: Vec<usize>,
	/// Seed words missing from the vocabulary, in input order.
	pub dropped_seed_words: Vec<String>,
}

impl Generation {
	/// Generated tokens joined by spaces.
	pub fn text(&self) -> String {
		self.tokens.join(" ")
	}

	/// Validated seed followed by the generated tokens.
	pub fn full_text(&self) -> String {
		self.seed.iter().chain(&self.tokens).map(String::as_str).collect::<Vec<_>>().join(" ")
	}
}

/// Samples word sequences from a model with backoff.
///
/// For each step the generator looks up the longest usable context first:
/// the last two words at order 3, then the last word at order 2, and falls
/// back to the unconditional order-1 distribution. The first order with
/// recorded continuations is sampled proportionally to the counts.
///
/// The generator only reads the model; each call keeps its own history.
#[derive(Debug, Clone)]
pub struct Generator<'a> {
	model: &'a MultiGramModel,
	tokenizer: Tokenizer,
}

impl<'a> Generator<'a> {
	/// Creates a generator over `model`, with the default tokenizer for seeds.
	pub fn new(model: &'a MultiGramModel) -> Self {
		Self::with_tokenizer(model, Tokenizer::default())
	}

	/// Creates a generator normalizing seeds with `tokenizer`.
	pub fn with_tokenizer(model: &'a MultiGramModel, tokenizer: Tokenizer) -> Self {
		Self { model, tokenizer }
	}

	/// Generates with the thread-local random generator.
	pub fn generate(&self, input: &PredictionInput) -> Result<Generation> {
		self.generate_with_rng(input, &mut rand::rng())
	}

	/// Generates `input.length` tokens, drawing from `rng`.
	///
	/// # Errors
	/// - [`LyrigenError::InvalidLength`] if the length is zero
	/// - [`LyrigenError::EmptyVocabulary`] if nothing can be sampled
	pub fn generate_with_rng<R: Rng + ?Sized>(&self, input: &PredictionInput, rng: &mut R) -> Result<Generation> {
		if input.length == 0 {
			return Err(LyrigenError::InvalidLength(input.length));
		}
		if self.model.vocabulary_size() == 0 {
			return Err(LyrigenError::EmptyVocabulary);
		}

		let (seed, dropped_seed_words) = self.validate_seed(&input.start_seed);
		let mut history = seed.clone();
		let mut tokens = Vec::with_capacity(input.length);
		let mut orders = Vec::with_capacity(input.length);

		for _ in 0..input.length {
			let (order, token) = self.next_token(&history, rng).ok_or(LyrigenError::EmptyVocabulary)?;
			let token = token.to_owned();
			history.push(token.clone());
			tokens.push(token);
			orders.push(order);
		}
		debug!("generated {} tokens, orders {:?}", tokens.len(), orders);

		Ok(Generation { seed, tokens, orders, dropped_seed_words })
	}

	/// Splits the seed into known words and words missing from the vocabulary.
	pub fn validate_seed(&self, seed: &StartSeed) -> (Vec<String>, Vec<String>) {
		let StartSeed::Custom(text) = seed else {
			return (Vec::new(), Vec::new());
		};
		let (known, unknown): (Vec<String>, Vec<String>) =
			self.tokenizer.tokenize(text).into_iter().partition(|word| self.model.contains(word));
		for word in &unknown {
			warn!("seed word {word:?} is not in the vocabulary, dropping it");
		}
		(known, unknown)
	}

	/// Samples the next token after `history`, returning the order used.
	///
	/// Returns `None` only when the vocabulary is empty.
	pub fn next_token<R: Rng + ?Sized>(&self, history: &[String], rng: &mut R) -> Option<(usize, &'a str)> {
		let model: &'a MultiGramModel = self.model;
		let highest = model.max_order().min(MAX_ORDER);
		for order in (2..=highest).rev() {
			let width = order - 1;
			if history.len() < width {
				continue;
			}
			let context = &history[history.len() - width..];
			if let Some(state) = model.lookup(context) {
				return state.predict(rng).map(|token| (order, token));
			}
		}
		model.unigrams()?.predict(rng).map(|token| (1, token))
	}
}
