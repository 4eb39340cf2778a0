use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A `[` or `(` up to the nearest `]` or `)` on the same line.
const ANNOTATION_PATTERN: &str = r"[\(\[].*?[\)\]]";

/// Options controlling how raw documents are cleaned before splitting.
///
/// The defaults suit scraped lyrics: bracketed annotations such as
/// `[Chorus]` or `(x2)` are not part of the sung text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenizerConfig {
	/// Remove `[...]` and `(...)` segments closed on the same line.
	pub strip_annotations: bool,
	/// Drop everything up to and including the first line break.
	pub skip_header_line: bool,
}

impl Default for TokenizerConfig {
	fn default() -> Self {
		Self { strip_annotations: true, skip_header_line: false }
	}
}

/// Converts raw document text into normalized word tokens.
///
/// Normalization order is fixed:
/// 1. optional header and annotation removal
/// 2. splitting on the original text: alphanumeric characters are kept,
///    apostrophes are deleted in place (`don't` -> `dont`), every other
///    character is a boundary
/// 3. lower-casing of each kept character
///
/// Splitting before folding keeps a word whole even when its lower-case
/// form contains a non-alphanumeric mark (`İ` folds to `i` + U+0307).
/// A token always contains at least one alphanumeric character.
/// Tokenization is a pure function of the input text.
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
	config: TokenizerConfig,
}

impl Tokenizer {
	/// Creates a tokenizer with the given options.
	pub fn new(config: TokenizerConfig) -> Self {
		Self { config }
	}

	/// Returns the options of this tokenizer.
	pub fn config(&self) -> &TokenizerConfig {
		&self.config
	}

	/// Splits one document into tokens, preserving their order.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut text = text;
		if self.config.skip_header_line {
			text = text.split_once('\n').map_or("", |(_, rest)| rest);
		}

		let cleaned;
		if self.config.strip_annotations {
			cleaned = strip_annotations(text);
			text = &cleaned;
		}

		let mut tokens = Vec::new();
		let mut current = String::new();
		for c in text.chars() {
			if c.is_alphanumeric() {
				current.extend(c.to_lowercase());
			} else if is_apostrophe(c) {
				continue;
			} else if !current.is_empty() {
				tokens.push(std::mem::take(&mut current));
			}
		}
		if !current.is_empty() {
			tokens.push(current);
		}
		tokens
	}
}

fn is_apostrophe(c: char) -> bool {
	matches!(c, '\'' | '\u{2019}' | '\u{02bc}')
}

/// Replaces every annotation with a space.
///
/// `.` does not cross line breaks, so an opener left unclosed on its line
/// (`:(`) is kept and scanning resumes right after it.
fn strip_annotations(text: &str) -> String {
	static ANNOTATION: OnceLock<Regex> = OnceLock::new();
	let annotation = ANNOTATION.get_or_init(|| Regex::new(ANNOTATION_PATTERN).expect("annotation pattern is valid"));
	annotation.replace_all(text, " ").into_owned()
}
