use std::path::PathBuf;

use clap::Parser;

/// Default upper bound on generated words per request.
pub const DEFAULT_MAX_LENGTH: usize = 500;

/// Server settings, from flags or environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "HTTP front end of the lyrics generator", long_about = None)]
pub struct ServerConfig {
	/// Address to bind
	#[arg(long, env = "LYRIGEN_HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Port to bind
	#[arg(long, env = "PORT", default_value_t = 5000)]
	pub port: u16,

	/// Model loaded at startup and written by training requests
	#[arg(long, env = "LYRIGEN_MODEL", default_value = "all_grams.tsv")]
	pub model: PathBuf,

	/// Directory training requests are resolved against
	#[arg(long, env = "LYRIGEN_CORPUS_ROOT", default_value = "data")]
	pub corpus_root: PathBuf,

	/// Largest accepted `length` for generation
	#[arg(long, env = "LYRIGEN_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
	pub max_length: usize,

	/// Do not write trained models back to `--model`
	#[arg(long)]
	pub no_persist: bool,

	/// Allow cross-origin requests from any origin
	#[arg(long)]
	pub cors: bool,
}

impl ServerConfig {
	/// Settings for tests: nothing persisted, corpus under `corpus_root`.
	#[cfg(test)]
	pub fn for_tests(corpus_root: PathBuf) -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 0,
			model: corpus_root.join("model.tsv"),
			corpus_root,
			max_length: DEFAULT_MAX_LENGTH,
			no_persist: true,
			cors: false,
		}
	}
}
