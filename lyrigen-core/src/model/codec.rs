//! Model file formats.
//!
//! The text format has one n-gram per line:
//!
//! ```text
//! <order>\t<context tokens, space separated>\t<continuation>\t<count>
//! ```
//!
//! The context field is empty for order 1. Lines are written sorted by
//! order, context and continuation; the loader accepts them in any order.
//! A repeated (order, context, continuation) triple is rejected rather than
//! summed, so a file always maps to exactly one table.
//!
//! The binary snapshot is the `postcard` encoding of the whole model.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::MAX_ORDER;
use super::multigram_model::MultiGramModel;
use crate::error::{LyrigenError, Result};
use crate::io::write_atomically;

const FIELD_SEPARATOR: char = '\t';
const TOKEN_SEPARATOR: char = ' ';

impl MultiGramModel {
	/// Writes the model in the text format.
	pub fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		for model in self.ngrams() {
			for state in model.states() {
				let context = state.context().join(" ");
				for (continuation, count) in state.transitions() {
					writeln!(writer, "{}\t{}\t{}\t{}", model.order(), context, continuation, count)?;
				}
			}
		}
		Ok(())
	}

	/// Returns the text format as a string.
	pub fn to_text(&self) -> String {
		let mut buffer = Vec::new();
		// Writing to a Vec cannot fail.
		let _ = self.write_text(&mut buffer);
		String::from_utf8_lossy(&buffer).into_owned()
	}

	/// Saves the model in the text format.
	///
	/// The file is written next to its destination and renamed into place,
	/// so an existing model is never left half-written.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		write_atomically(path.as_ref(), |writer| self.write_text(writer))
	}

	/// Parses the text format from a buffered reader.
	///
	/// # Errors
	/// - [`LyrigenError::MalformedModelLine`] for any line that does not
	///   follow the format, or whose tokens are missing from the vocabulary
	/// - [`LyrigenError::DuplicateEntry`] for a repeated n-gram
	pub fn read_text<R: BufRead>(reader: R) -> Result<Self> {
		let mut model = MultiGramModel::new(1)?;
		// Tokens used by orders >= 2, with the first line using them.
		let mut context_tokens: BTreeMap<String, usize> = BTreeMap::new();

		for (index, line) in reader.lines().enumerate() {
			let number = index + 1;
			let line = line.map_err(|err| LyrigenError::io(err, None))?;
			if line.is_empty() {
				continue;
			}
			let entry = parse_line(&line, number)?;

			let already = model
				.lookup(&entry.context)
				.and_then(|state| state.count(entry.continuation))
				.is_some();
			if already {
				return Err(LyrigenError::DuplicateEntry {
					line: number,
					order: entry.order,
					context: entry.context.join(" "),
					continuation: entry.continuation.to_owned(),
				});
			}
			model.add_count(&entry.context, entry.continuation, entry.count)?;

			if entry.order > 1 {
				for token in entry.context.iter().map(String::as_str).chain([entry.continuation]) {
					context_tokens.entry(token.to_owned()).or_insert(number);
				}
			}
		}

		if let Some(token) = unknown_token(&model) {
			let line = context_tokens.get(token).copied().unwrap_or_default();
			return Err(LyrigenError::malformed(line, format!("token {token:?} has no order-1 entry")));
		}
		Ok(model)
	}

	/// Parses the text format from a string.
	pub fn from_text(text: &str) -> Result<Self> {
		Self::read_text(text.as_bytes())
	}

	/// Loads a model saved in the text format.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).map_err(|err| LyrigenError::io(err, Some(path.to_path_buf())))?;
		Self::read_text(BufReader::new(file)).map_err(|err| match err {
			LyrigenError::Io { source, path: None } => LyrigenError::io(source, Some(path.to_path_buf())),
			other => other,
		})
	}

	/// Saves the model as a binary snapshot.
	pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		write_atomically(path.as_ref(), |writer| writer.write_all(&bytes))
	}

	/// Loads a binary snapshot.
	///
	/// The decoded model goes through the same checks as a text file:
	/// context lengths, positive counts, valid tokens and the vocabulary
	/// rule.
	///
	/// # Errors
	/// [`LyrigenError::Snapshot`] if the bytes do not decode or describe an
	/// inconsistent table.
	pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).map_err(|err| LyrigenError::io(err, Some(path.to_path_buf())))?;
		Self::from_snapshot_bytes(&bytes)
	}

	fn from_snapshot_bytes(bytes: &[u8]) -> Result<Self> {
		let model: MultiGramModel = postcard::from_bytes(bytes)?;
		model.validate()?;
		for table in model.ngrams() {
			for state in table.states() {
				let tokens = state.context().iter().map(String::as_str);
				for token in tokens.chain(state.transitions().map(|(token, _)| token)) {
					check_token(token).map_err(LyrigenError::Snapshot)?;
				}
			}
		}
		if let Some(token) = unknown_token(&model) {
			return Err(LyrigenError::Snapshot(format!("token {token:?} has no order-1 entry")));
		}
		Ok(model)
	}
}

/// First token used at order 2 or above that has no order-1 entry.
fn unknown_token(model: &MultiGramModel) -> Option<&str> {
	model
		.ngrams()
		.filter(|table| table.order() > 1)
		.flat_map(|table| table.states())
		.flat_map(|state| {
			let context = state.context().iter().map(String::as_str);
			context.chain(state.transitions().map(|(token, _)| token))
		})
		.find(|token| !model.contains(token))
}

fn check_token(token: &str) -> std::result::Result<(), String> {
	if token.is_empty() || token.chars().any(char::is_whitespace) {
		return Err(format!("invalid token {token:?}"));
	}
	Ok(())
}

/// Parses a field made of ASCII digits only; `str::parse` alone would
/// also take a leading `+`.
fn parse_digits<T: std::str::FromStr>(field: &str) -> Option<T> {
	if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	field.parse().ok()
}

struct Entry<'a> {
	order: usize,
	context: Vec<String>,
	continuation: &'a str,
	count: u64,
}

fn parse_line(line: &str, number: usize) -> Result<Entry<'_>> {
	let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
	let [order, context, continuation, count] = fields[..] else {
		return Err(LyrigenError::malformed(number, format!("expected 4 tab-separated fields, found {}", fields.len())));
	};

	let order: usize = parse_digits(order)
		.ok_or_else(|| LyrigenError::malformed(number, format!("order {order:?} is not an integer")))?;
	if !(1..=MAX_ORDER).contains(&order) {
		return Err(LyrigenError::malformed(number, format!("order {order} outside 1..={MAX_ORDER}")));
	}

	let context: Vec<String> = if context.is_empty() {
		Vec::new()
	} else {
		context.split(TOKEN_SEPARATOR).map(str::to_owned).collect()
	};
	if context.len() != order - 1 {
		return Err(LyrigenError::malformed(
			number,
			format!("order {order} needs {} context tokens, found {}", order - 1, context.len()),
		));
	}
	for token in context.iter().map(String::as_str).chain([continuation]) {
		check_token(token).map_err(|reason| LyrigenError::malformed(number, reason))?;
	}

	let count: u64 = parse_digits(count)
		.ok_or_else(|| LyrigenError::malformed(number, format!("count {count:?} is not an integer")))?;
	if count == 0 {
		return Err(LyrigenError::malformed(number, "count must be positive"));
	}

	Ok(Entry { order, context, continuation, count })
}
