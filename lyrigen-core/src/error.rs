//! Error handling shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = LyrigenError> = std::result::Result<T, E>;

/// Fatal failures of a training run, a model load or a generation call.
///
/// Recoverable conditions (an unreadable corpus document, an unknown seed
/// word) are not errors: they are reported in `TrainingSummary` and
/// `Generation` respectively.
#[derive(Debug, Error)]
pub enum LyrigenError {
	/// The corpus directory or model file does not exist.
	#[error("input not found: {}", path.display())]
	InputNotFound {
		/// Missing path.
		path: PathBuf,
	},
	/// No document of the corpus could be read.
	#[error("no readable document in {} ({found} found)", dir.display())]
	EmptyCorpus {
		/// Corpus directory.
		dir: PathBuf,
		/// Number of candidate documents discovered.
		found: usize,
	},
	/// A model file line does not follow `<order>\t<context>\t<continuation>\t<count>`.
	#[error("malformed model line {line}: {reason}")]
	MalformedModelLine {
		/// 1-based line number.
		line: usize,
		/// What is wrong with it.
		reason: String,
	},
	/// The same n-gram appears twice in a model file.
	#[error("duplicate entry on line {line}: order {order}, context {context:?}, continuation {continuation:?}")]
	DuplicateEntry {
		/// 1-based line number of the second occurrence.
		line: usize,
		/// N-gram order.
		order: usize,
		/// Space-joined context.
		context: String,
		/// Continuation token.
		continuation: String,
	},
	/// The model has no order-1 entries, nothing can be sampled.
	#[error("model vocabulary is empty")]
	EmptyVocabulary,
	/// Requested n-gram order outside `1..=3`.
	#[error("order must be between 1 and {max}, got {0}", max = crate::model::MAX_ORDER)]
	InvalidOrder(usize),
	/// Requested generation length is not positive.
	#[error("length must be a positive integer, got {0}")]
	InvalidLength(usize),
	/// Filesystem error with the path it happened on.
	#[error("io error while processing {path:?}: {source}")]
	Io {
		/// Underlying IO error.
		source: std::io::Error,
		/// Path associated with the failure if available.
		path: Option<PathBuf>,
	},
	/// Binary snapshot encoding or decoding failure.
	#[error("snapshot error: {0}")]
	Snapshot(String),
}

impl From<postcard::Error> for LyrigenError {
	fn from(err: postcard::Error) -> Self {
		Self::Snapshot(err.to_string())
	}
}

impl LyrigenError {
	/// Wraps an IO error, mapping `NotFound` on a known path to [`LyrigenError::InputNotFound`].
	pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
		match (source.kind(), path) {
			(std::io::ErrorKind::NotFound, Some(path)) => Self::InputNotFound { path },
			(_, path) => Self::Io { source, path },
		}
	}

	/// Shorthand for [`LyrigenError::MalformedModelLine`].
	pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
		Self::MalformedModelLine { line, reason: reason.into() }
	}
}
