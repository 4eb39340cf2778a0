/// Default number of generated tokens.
pub const DEFAULT_LENGTH: usize = 20;

/// Strategy used to select the starting history when generating.
///
/// # Variants
/// - `Custom(String)`: seed text; it is tokenized and every word missing
///   from the vocabulary is dropped.
/// - `False`: no seed, the first word is drawn from the order-1 distribution.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub enum StartSeed {
	Custom(String),
	#[default]
	False,
}

impl StartSeed {
	/// Builds a seed from optional user text; blank text means no seed.
	pub fn from_text(text: Option<&str>) -> Self {
		match text.map(str::trim) {
			Some(text) if !text.is_empty() => StartSeed::Custom(text.to_owned()),
			_ => StartSeed::False,
		}
	}
}

/// Input parameters of one generation call.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PredictionInput {
	/// Exact number of tokens to generate, seed excluded.
	pub length: usize,

	/// Optional starting history.
	pub start_seed: StartSeed,
}

impl PredictionInput {
	/// Creates an input generating `length` tokens after `start_seed`.
	pub fn new(length: usize, start_seed: StartSeed) -> Self {
		Self { length, start_seed }
	}
}

impl Default for PredictionInput {
	fn default() -> Self {
		Self::new(DEFAULT_LENGTH, StartSeed::False)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_seed_text_means_no_seed() {
		assert_eq!(StartSeed::from_text(None), StartSeed::False);
		assert_eq!(StartSeed::from_text(Some("   ")), StartSeed::False);
		assert_eq!(StartSeed::from_text(Some(" i was ")), StartSeed::Custom("i was".to_owned()));
	}
}
