use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::State;
use super::MAX_ORDER;
use crate::error::{LyrigenError, Result};

/// Counts of every n-gram of a single order `n`.
///
/// The `NGramModel` stores one [`State`] per observed context of `n-1`
/// tokens. For `n == 1` there is exactly one state, keyed by the empty
/// context, whose continuations are the whole vocabulary.
///
/// # Invariants
/// - `1 <= n <= MAX_ORDER`
/// - Every key of `states` has exactly `n-1` tokens and equals the
///   context of the state it maps to
/// - No state is empty
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	/// The order of the model (number of tokens in the n-gram).
	n: usize,

	/// Mapping from a context (length n-1) to its state.
	states: BTreeMap<Vec<String>, State>,
}

/// Size figures of one order, reported by training and the server.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderStats {
	/// N-gram order.
	pub order: usize,
	/// Number of distinct contexts.
	pub contexts: usize,
	/// Number of distinct (context, continuation) pairs.
	pub distinct: usize,
	/// Sum of all counts, i.e. n-gram occurrences in the corpus.
	pub total: u64,
}

impl NGramModel {
	/// Creates a new empty model of order `n`.
	///
	/// # Errors
	/// Returns [`LyrigenError::InvalidOrder`] if `n` is not in `1..=MAX_ORDER`.
	pub fn new(n: usize) -> Result<Self> {
		if !(1..=MAX_ORDER).contains(&n) {
			return Err(LyrigenError::InvalidOrder(n));
		}
		Ok(Self { n, states: BTreeMap::new() })
	}

	/// Order of this model.
	pub fn order(&self) -> usize {
		self.n
	}

	/// Adds every window of `n` tokens of one document.
	///
	/// Sequences shorter than `n` contribute nothing.
	pub fn add_sentence(&mut self, tokens: &[String]) {
		for window in tokens.windows(self.n) {
			let (context, continuation) = window.split_at(self.n - 1);
			self.state_mut(context).add_transition(&continuation[0]);
		}
	}

	/// Records `count` occurrences of one n-gram. Used by loaders.
	///
	/// The caller guarantees `context.len() == n - 1`.
	pub(crate) fn add_count(&mut self, context: &[String], continuation: &str, count: u64) {
		if count == 0 {
			return;
		}
		self.state_mut(context).add_transitions(continuation, count);
	}

	fn state_mut(&mut self, context: &[String]) -> &mut State {
		self.states
			.entry(context.to_vec())
			.or_insert_with(|| State::new(context.to_vec()))
	}

	/// Returns the state of `context`, if that context was ever observed.
	pub fn get(&self, context: &[String]) -> Option<&State> {
		self.states.get(context).filter(|state| !state.is_empty())
	}

	/// Iterates all states in context order.
	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	/// Whether nothing was recorded for this order.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Checks the invariants of a table that did not come from
	/// `add_sentence`, describing the first violation.
	pub(crate) fn check(&self) -> std::result::Result<(), String> {
		for (key, state) in &self.states {
			if key.as_slice() != state.context() {
				return Err(format!("order {} state {:?} filed under {:?}", self.n, state.context(), key));
			}
			if key.len() != self.n - 1 {
				return Err(format!("order {} context {:?} has {} tokens", self.n, key, key.len()));
			}
			if state.is_empty() {
				return Err(format!("order {} context {:?} has no continuation", self.n, key));
			}
			if let Some((token, _)) = state.transitions().find(|(_, count)| *count == 0) {
				return Err(format!("order {} continuation {token:?} has a zero count", self.n));
			}
		}
		Ok(())
	}

	/// Computes contexts, distinct pairs and total occurrences.
	pub fn stats(&self) -> OrderStats {
		OrderStats {
			order: self.n,
			contexts: self.states.len(),
			distinct: self.states.values().map(State::len).sum(),
			total: self.states.values().map(State::total).sum(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(text: &str) -> Vec<String> {
		text.split_whitespace().map(str::to_owned).collect()
	}

	#[test]
	fn rejects_out_of_range_orders() {
		assert!(matches!(NGramModel::new(0), Err(LyrigenError::InvalidOrder(0))));
		assert!(matches!(NGramModel::new(4), Err(LyrigenError::InvalidOrder(4))));
		assert!(NGramModel::new(1).is_ok());
	}

	#[test]
	fn counted_tables_pass_their_own_check() {
		let mut model = NGramModel::new(3).unwrap();
		model.add_sentence(&words("we will rock you"));
		model.add_count(&words("rock you"), "now", 4);
		assert_eq!(model.check(), Ok(()));
	}

	#[test]
	fn check_reports_short_contexts() {
		let mut model = NGramModel::new(2).unwrap();
		model.add_count(&[], "orphan", 1);
		let reason = model.check().unwrap_err();
		assert!(reason.contains("has 0 tokens"), "{reason}");
	}

	#[test]
	fn bigram_windows_are_counted_per_context() {
		let mut model = NGramModel::new(2).unwrap();
		model.add_sentence(&words("a b a b c"));

		let a = model.get(&words("a")).unwrap();
		assert_eq!(a.count("b"), Some(2));
		let b = model.get(&words("b")).unwrap();
		assert_eq!(b.count("a"), Some(1));
		assert_eq!(b.count("c"), Some(1));
		assert!(model.get(&words("c")).is_none());

		let stats = model.stats();
		assert_eq!((stats.contexts, stats.distinct, stats.total), (2, 3, 4));
	}

	#[test]
	fn short_sequences_are_ignored() {
		let mut model = NGramModel::new(3).unwrap();
		model.add_sentence(&words("a b"));
		model.add_sentence(&[]);
		assert!(model.is_empty());
	}

	#[test]
	fn unigram_uses_empty_context() {
		let mut model = NGramModel::new(1).unwrap();
		model.add_sentence(&words("x y x"));
		let state = model.get(&[]).unwrap();
		assert!(state.context().is_empty());
		assert_eq!(state.count("x"), Some(2));
		assert_eq!(state.count("y"), Some(1));
	}
}
