use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use lyrigen_core::io::{load_model_file, snapshot_path, SNAPSHOT_EXTENSION};
use lyrigen_core::model::generator::Generator;
use lyrigen_core::model::prediction_input::{DEFAULT_LENGTH, PredictionInput, StartSeed};
use lyrigen_core::tokenizer::TokenizerConfig;
use lyrigen_core::trainer::{Trainer, TrainerConfig};
use lyrigen_core::MAX_ORDER;

const DEFAULT_MODEL: &str = "all_grams.tsv";

#[derive(Parser, Debug)]
#[command(author, version, about = "Word n-gram lyrics generator", long_about = None)]
struct Cli {
	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, global = true, action = ArgAction::Count)]
	verbose: u8,

	/// Decrease verbosity (-q, -qq)
	#[arg(short = 'q', long, global = true, action = ArgAction::Count)]
	quiet: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Count n-grams of a directory of text files and save the model
	Train(TrainArgs),
	/// Sample a word sequence from a saved model
	Generate(GenerateArgs),
	/// Print the statistics of a saved model
	Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
	/// Directory of plain-text documents (not recursive)
	#[arg(short, long, value_name = "DIR", default_value = "data")]
	input_dir: PathBuf,

	/// Output model path (text format)
	#[arg(short, long, value_name = "PATH", default_value = DEFAULT_MODEL)]
	model: PathBuf,

	/// Highest n-gram order to count
	#[arg(long, value_name = "N", default_value_t = MAX_ORDER)]
	max_order: usize,

	/// Only read files with this extension
	#[arg(long, value_name = "EXT")]
	extension: Option<String>,

	/// Keep [bracketed] and (parenthesized) annotations
	#[arg(long)]
	keep_annotations: bool,

	/// Drop the first line of every document (title headers)
	#[arg(long)]
	skip_header: bool,

	/// Also write a binary snapshot next to the model
	#[arg(long)]
	snapshot: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
	/// Model path (`.bin` for snapshots, text format otherwise)
	#[arg(short, long, value_name = "PATH", default_value = DEFAULT_MODEL)]
	model: PathBuf,

	/// Seed words the sequence continues from
	#[arg(short, long, value_name = "WORD", num_args = 1..)]
	prefix: Vec<String>,

	/// Number of words to generate
	#[arg(short, long, value_name = "COUNT", default_value_t = DEFAULT_LENGTH)]
	length: usize,

	/// Write the generated text to a file as well
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,

	/// Seed the random generator for reproducible output
	#[arg(long, value_name = "SEED")]
	rng_seed: Option<u64>,

	/// Print the validated prefix before the generated words
	#[arg(long)]
	with_prefix: bool,
}

#[derive(Args, Debug)]
struct StatsArgs {
	/// Model path
	#[arg(short, long, value_name = "PATH", default_value = DEFAULT_MODEL)]
	model: PathBuf,
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	match cli.command {
		Commands::Train(args) => run_train(args),
		Commands::Generate(args) => run_generate(args),
		Commands::Stats(args) => run_stats(args),
	}
}

fn init_logging(verbose: u8, quiet: u8) {
	use log::LevelFilter;

	let level = if quiet > 0 {
		match quiet {
			1 => LevelFilter::Warn,
			_ => LevelFilter::Error,
		}
	} else {
		match verbose {
			0 => LevelFilter::Info,
			1 => LevelFilter::Debug,
			_ => LevelFilter::Trace,
		}
	};

	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
	builder.format_timestamp_millis();
	builder.filter_level(level);
	let _ = builder.try_init();
}

fn run_train(args: TrainArgs) -> Result<()> {
	let mut builder = TrainerConfig::builder()
		.max_order(args.max_order)
		.tokenizer(TokenizerConfig { strip_annotations: !args.keep_annotations, skip_header_line: args.skip_header });
	if let Some(extension) = args.extension {
		builder = builder.extension(extension);
	}
	let trainer = Trainer::new(builder.build()?)?;

	let snapshot = if args.snapshot {
		let path = snapshot_path(&args.model).with_context(|| {
			format!("{} already has the .{SNAPSHOT_EXTENSION} extension of snapshots", args.model.display())
		})?;
		Some(path)
	} else {
		None
	};

	let outcome = trainer
		.train_directory(&args.input_dir)
		.with_context(|| format!("training on {}", args.input_dir.display()))?;

	outcome
		.model
		.save(&args.model)
		.with_context(|| format!("saving model to {}", args.model.display()))?;
	info!("model written to {}", args.model.display());

	if let Some(snapshot) = snapshot {
		outcome
			.model
			.save_snapshot(&snapshot)
			.with_context(|| format!("saving snapshot to {}", snapshot.display()))?;
		info!("snapshot written to {}", snapshot.display());
	}

	for failure in &outcome.summary.failures {
		println!("skipped {}: {}", failure.id, failure.reason);
	}
	print!("{}", outcome.summary);
	Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
	let model = load_model_file(&args.model).with_context(|| format!("loading model {}", args.model.display()))?;

	let seed_text = args.prefix.join(" ");
	let input = PredictionInput::new(args.length, StartSeed::from_text(Some(seed_text.as_str())));
	let generator = Generator::new(&model);
	let generation = match args.rng_seed {
		Some(seed) => generator.generate_with_rng(&input, &mut StdRng::seed_from_u64(seed)),
		None => generator.generate(&input),
	}?;

	if !generation.dropped_seed_words.is_empty() {
		warn!("dropped unknown prefix words: {}", generation.dropped_seed_words.join(" "));
	}

	let text = if args.with_prefix { generation.full_text() } else { generation.text() };
	if let Some(output) = &args.output {
		fs::write(output, format!("{text}\n")).with_context(|| format!("writing {}", output.display()))?;
		info!("generated text written to {}", output.display());
	}
	println!("{text}");
	Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
	let model = load_model_file(&args.model).with_context(|| format!("loading model {}", args.model.display()))?;
	print!("{}", model.stats());
	Ok(())
}
