use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

/// Exact proportional sampler over a finite set of weighted tokens.
///
/// Built on demand from a continuation table. Tokens keep the order they
/// are supplied in and the draw is delegated to [`WeightedIndex`], which
/// samples index `i` with probability `weight_i / total`. Zero weights are
/// skipped so they can never be drawn.
#[derive(Debug, Clone)]
pub struct WeightedSampler<'a> {
	tokens: Vec<&'a str>,
	/// `None` when there is nothing to draw.
	index: Option<WeightedIndex<u64>>,
}

impl<'a> WeightedSampler<'a> {
	/// Builds the distribution from `(token, weight)` pairs.
	pub fn new<I>(entries: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, u64)>,
	{
		let (tokens, weights): (Vec<&str>, Vec<u64>) =
			entries.into_iter().filter(|(_, weight)| *weight > 0).unzip();
		// Fails only for an empty table or a total above u64::MAX.
		let index = WeightedIndex::new(&weights).ok();
		Self { tokens, index }
	}

	/// Sum of all weights.
	pub fn total(&self) -> u64 {
		self.index.as_ref().map_or(0, WeightedIndex::total_weight)
	}

	/// Whether there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.index.is_none()
	}

	/// Draws one token with probability `weight / total`.
	///
	/// Returns `None` if the sampler is empty.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'a str> {
		let index = self.index.as_ref()?;
		self.tokens.get(index.sample(rng)).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use std::collections::HashMap;

	#[test]
	fn empty_sampler_draws_nothing() {
		let sampler = WeightedSampler::new(Vec::<(&str, u64)>::new());
		assert!(sampler.is_empty());
		assert_eq!(sampler.sample(&mut StdRng::seed_from_u64(1)), None);
	}

	#[test]
	fn zero_weights_are_never_drawn() {
		let sampler = WeightedSampler::new([("never", 0), ("always", 3)]);
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..200 {
			assert_eq!(sampler.sample(&mut rng), Some("always"));
		}
	}

	#[test]
	fn draws_follow_weights() {
		let sampler = WeightedSampler::new([("a", 1), ("b", 3)]);
		assert_eq!(sampler.total(), 4);

		let mut rng = StdRng::seed_from_u64(42);
		let mut seen: HashMap<&str, usize> = HashMap::new();
		for _ in 0..8000 {
			*seen.entry(sampler.sample(&mut rng).unwrap()).or_default() += 1;
		}
		let b_share = seen["b"] as f64 / 8000.0;
		assert!((0.70..0.80).contains(&b_share), "b drawn {b_share}");
	}
}
