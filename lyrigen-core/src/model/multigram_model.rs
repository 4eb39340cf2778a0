use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::MAX_ORDER;
use super::ngram_model::{NGramModel, OrderStats};
use super::state::State;
use crate::error::{LyrigenError, Result};

/// The n-gram table of every order from 1 to `max_order`: the model.
///
/// This struct manages:
/// - `ngrams`: a map from order to its corresponding [`NGramModel`];
///   every order in `1..=max_order` is present, possibly empty
/// - `max_order`: the highest order counted during training (or found in
///   a loaded file)
///
/// The vocabulary is the continuation set of the order-1 empty context.
/// Training feeds each document to every order, so every token seen at any
/// order is also in the vocabulary.
///
/// A model is built once (trainer or loader) and then only read; it can be
/// shared between threads behind an `Arc`.
///
/// Two models are equal when they hold the same (order, context,
/// continuation, count) entries. An order with no entries does not count:
/// a model trained at order 3 on two-word documents equals its text round
/// trip, whose `max_order` is 2.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MultiGramModel {
	max_order: usize,
	ngrams: BTreeMap<usize, NGramModel>,
}

/// Summary of a model: per-order figures and vocabulary size.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelStats {
	/// Highest order with at least one entry, 0 for an empty model.
	pub max_order: usize,
	/// Number of distinct tokens.
	pub vocabulary: usize,
	/// One entry per order present, ascending.
	pub orders: Vec<OrderStats>,
}

impl MultiGramModel {
	/// Creates an empty model counting orders `1..=max_order`.
	///
	/// # Errors
	/// Returns [`LyrigenError::InvalidOrder`] if `max_order` is not in `1..=MAX_ORDER`.
	pub fn new(max_order: usize) -> Result<Self> {
		if !(1..=MAX_ORDER).contains(&max_order) {
			return Err(LyrigenError::InvalidOrder(max_order));
		}
		let mut ngrams = BTreeMap::new();
		for n in 1..=max_order {
			ngrams.insert(n, NGramModel::new(n)?);
		}
		Ok(Self { max_order, ngrams })
	}

	/// Highest order the model counts (the trainer's setting, or the
	/// highest order found in a loaded file).
	pub fn max_order(&self) -> usize {
		self.max_order
	}

	/// Counts every n-gram of one document, for each order up to `max_order`.
	///
	/// Windows never extend past the given sequence, so calling this once
	/// per document keeps n-grams from spanning two documents. An empty
	/// sequence is a no-op.
	pub fn observe(&mut self, tokens: &[String]) {
		for model in self.ngrams.values_mut() {
			model.add_sentence(tokens);
		}
	}

	/// Records `count` occurrences of one n-gram of order `context.len() + 1`.
	pub(crate) fn add_count(&mut self, context: &[String], continuation: &str, count: u64) -> Result<()> {
		let order = context.len() + 1;
		if order > MAX_ORDER {
			return Err(LyrigenError::InvalidOrder(order));
		}
		if order > self.max_order {
			for n in self.max_order + 1..=order {
				self.ngrams.insert(n, NGramModel::new(n)?);
			}
			self.max_order = order;
		}
		if let Some(model) = self.ngrams.get_mut(&order) {
			model.add_count(context, continuation, count);
		}
		Ok(())
	}

	/// Model of a single order, if within `1..=max_order`.
	pub fn ngram(&self, order: usize) -> Option<&NGramModel> {
		self.ngrams.get(&order)
	}

	/// Iterates the per-order models in ascending order.
	pub fn ngrams(&self) -> impl Iterator<Item = &NGramModel> {
		self.ngrams.values()
	}

	/// Continuations recorded after `context` at order `context.len() + 1`.
	///
	/// Returns `None` when that context was never observed, or when the
	/// order exceeds `max_order`.
	pub fn lookup(&self, context: &[String]) -> Option<&State> {
		self.ngrams.get(&(context.len() + 1))?.get(context)
	}

	/// Order-1 distribution, `None` if the vocabulary is empty.
	pub fn unigrams(&self) -> Option<&State> {
		self.lookup(&[])
	}

	/// Iterates the vocabulary in token order.
	pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
		self.unigrams().into_iter().flat_map(|state| state.transitions().map(|(token, _)| token))
	}

	/// Number of distinct tokens.
	pub fn vocabulary_size(&self) -> usize {
		self.unigrams().map_or(0, State::len)
	}

	/// Whether `token` belongs to the vocabulary.
	pub fn contains(&self, token: &str) -> bool {
		self.unigrams().is_some_and(|state| state.count(token).is_some())
	}

	/// Iterates the orders holding at least one entry.
	fn present(&self) -> impl Iterator<Item = &NGramModel> {
		self.ngrams.values().filter(|model| !model.is_empty())
	}

	/// Figures of every order present and vocabulary size.
	pub fn stats(&self) -> ModelStats {
		let orders: Vec<OrderStats> = self.present().map(NGramModel::stats).collect();
		ModelStats {
			max_order: orders.last().map_or(0, |order| order.order),
			vocabulary: self.vocabulary_size(),
			orders,
		}
	}

	/// Checks structural invariants of a model decoded from a snapshot.
	pub(crate) fn validate(&self) -> Result<()> {
		if !(1..=MAX_ORDER).contains(&self.max_order) {
			return Err(LyrigenError::InvalidOrder(self.max_order));
		}
		for n in 1..=self.max_order {
			match self.ngrams.get(&n) {
				Some(model) if model.order() == n => {}
				_ => return Err(LyrigenError::Snapshot(format!("order {n} table missing or mislabeled"))),
			}
		}
		if self.ngrams.len() != self.max_order {
			return Err(LyrigenError::Snapshot("unexpected orders above max_order".to_owned()));
		}
		for model in self.ngrams.values() {
			model.check().map_err(LyrigenError::Snapshot)?;
		}
		Ok(())
	}
}

impl PartialEq for MultiGramModel {
	fn eq(&self, other: &Self) -> bool {
		self.present().eq(other.present())
	}
}

impl Eq for MultiGramModel {}

impl fmt::Display for ModelStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "max order:  {}", self.max_order)?;
		writeln!(f, "vocabulary: {}", self.vocabulary)?;
		for order in &self.orders {
			writeln!(
				f,
				"{}-grams:    {} distinct, {} total, {} contexts",
				order.order, order.distinct, order.total, order.contexts
			)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(text: &str) -> Vec<String> {
		text.split_whitespace().map(str::to_owned).collect()
	}

	fn two_document_model() -> MultiGramModel {
		let mut model = MultiGramModel::new(2).unwrap();
		model.observe(&words("a b a b c"));
		model.observe(&words("b a b"));
		model
	}

	#[test]
	fn counts_match_two_document_example() {
		let model = two_document_model();

		let unigrams = model.unigrams().unwrap();
		assert_eq!(unigrams.count("a"), Some(3));
		assert_eq!(unigrams.count("b"), Some(4));
		assert_eq!(unigrams.count("c"), Some(1));

		let after_a = model.lookup(&words("a")).unwrap();
		assert_eq!(after_a.transitions().collect::<Vec<_>>(), [("b", 3)]);
		let after_b = model.lookup(&words("b")).unwrap();
		assert_eq!(after_b.transitions().collect::<Vec<_>>(), [("a", 2), ("c", 1)]);
	}

	#[test]
	fn windows_do_not_cross_documents() {
		let model = two_document_model();
		// "c" ends the first document, "b" starts the second.
		assert!(model.lookup(&words("c")).is_none());
	}

	#[test]
	fn context_totals_equal_following_occurrences() {
		let mut model = MultiGramModel::new(3).unwrap();
		let doc = words("la la di la la di da");
		model.observe(&doc);

		for n in 2..=3 {
			for state in model.ngram(n).unwrap().states() {
				let context = state.context();
				let followed = doc.windows(n).filter(|w| &w[..n - 1] == context).count() as u64;
				assert_eq!(state.total(), followed, "context {context:?}");
			}
		}
	}

	#[test]
	fn vocabulary_covers_every_token() {
		let model = two_document_model();
		assert_eq!(model.vocabulary().collect::<Vec<_>>(), ["a", "b", "c"]);
		assert_eq!(model.vocabulary_size(), 3);
		assert!(model.contains("c"));
		assert!(!model.contains("d"));
	}

	#[test]
	fn stats_report_present_orders() {
		let stats = two_document_model().stats();
		assert_eq!(stats.max_order, 2);
		assert_eq!(stats.vocabulary, 3);
		assert_eq!(stats.orders[0], OrderStats { order: 1, contexts: 1, distinct: 3, total: 8 });
		assert_eq!(stats.orders[1], OrderStats { order: 2, contexts: 2, distinct: 3, total: 6 });
		assert!(stats.to_string().contains("2-grams:"));
	}

	#[test]
	fn empty_top_order_is_not_reported() {
		let mut model = MultiGramModel::new(3).unwrap();
		model.observe(&words("hey jude"));
		let stats = model.stats();
		assert_eq!(model.max_order(), 3);
		assert_eq!(stats.max_order, 2);
		assert_eq!(stats.orders.len(), 2);
		assert!(!stats.to_string().contains("3-grams:"));

		assert_eq!(MultiGramModel::new(3).unwrap().stats().max_order, 0);
	}

	#[test]
	fn equality_ignores_empty_orders() {
		let mut wide = MultiGramModel::new(3).unwrap();
		wide.observe(&words("hey jude"));
		let mut narrow = MultiGramModel::new(2).unwrap();
		narrow.observe(&words("hey jude"));
		assert_eq!(wide, narrow);

		narrow.observe(&words("jude"));
		assert_ne!(wide, narrow);
	}

	#[test]
	fn lookup_above_max_order_is_none() {
		let model = two_document_model();
		assert!(model.lookup(&words("a b")).is_none());
	}

	#[test]
	fn training_twice_yields_identical_tables() {
		assert_eq!(two_document_model(), two_document_model());
	}

	#[test]
	fn rejects_invalid_max_order() {
		assert!(matches!(MultiGramModel::new(0), Err(LyrigenError::InvalidOrder(0))));
		assert!(matches!(MultiGramModel::new(4), Err(LyrigenError::InvalidOrder(4))));
	}
}
