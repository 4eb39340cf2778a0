use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::sampler::WeightedSampler;

/// Represents a context in an n-gram model.
///
/// A `State` corresponds to a fixed (n-1)-token context (`context`) and
/// stores every continuation observed after it, with its count.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - All transitions belong to the same `context`
/// - Each transition count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
	/// Context tokens (empty for order 1).
	context: Vec<String>,
	/// Continuation token -> number of observations.
	transitions: BTreeMap<String, u64>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(context: Vec<String>) -> Self {
		Self { context, transitions: BTreeMap::new() }
	}

	/// Context tokens of this state.
	pub fn context(&self) -> &[String] {
		&self.context
	}

	/// Records one more occurrence of `continuation` after this context.
	pub fn add_transition(&mut self, continuation: &str) {
		self.add_transitions(continuation, 1);
	}

	/// Records `count` occurrences of `continuation`. A zero count is ignored.
	pub(crate) fn add_transitions(&mut self, continuation: &str, count: u64) {
		if count == 0 {
			return;
		}
		match self.transitions.get_mut(continuation) {
			Some(existing) => *existing += count,
			None => {
				self.transitions.insert(continuation.to_owned(), count);
			}
		}
	}

	/// Count recorded for `continuation`, if any.
	pub fn count(&self, continuation: &str) -> Option<u64> {
		self.transitions.get(continuation).copied()
	}

	/// Iterates continuations with their counts, in token order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, u64)> {
		self.transitions.iter().map(|(token, count)| (token.as_str(), *count))
	}

	/// Number of distinct continuations.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	/// Whether no continuation was ever recorded.
	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Sum of all continuation counts.
	pub fn total(&self) -> u64 {
		self.transitions.values().sum()
	}

	/// Predicts the next token using weighted random sampling.
	///
	/// The probability of selecting a token is its count divided by
	/// [`State::total`]. Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		WeightedSampler::new(self.transitions()).sample(rng)
	}
}
