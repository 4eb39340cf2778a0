use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use lyrigen_core::io::{load_model_file, model_name};
use lyrigen_core::model::multigram_model::MultiGramModel;
use lyrigen_core::model::store::ModelStore;
use lyrigen_core::{LyrigenError, MAX_ORDER};

mod config;
mod error;
mod routes;

use config::ServerConfig;
use routes::AppState;

/// Main entry point for the server.
///
/// Loads the configured model if present (an empty model otherwise, so
/// that one can be uploaded or trained), then serves the API.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
	let config = ServerConfig::parse();

	let store = match load_model_file(&config.model) {
		Ok(model) => {
			let name = model_name(&config.model);
			info!("loaded {} ({} words)", config.model.display(), model.vocabulary_size());
			ModelStore::new(name, model)
		}
		Err(LyrigenError::InputNotFound { path }) => {
			warn!("model {} not found, starting empty; train or upload one", path.display());
			ModelStore::new("empty", MultiGramModel::new(MAX_ORDER)?)
		}
		Err(err) => return Err(err).with_context(|| format!("loading {}", config.model.display())),
	};

	let bind = (config.host.clone(), config.port);
	let cors = config.cors;
	let state = web::Data::new(AppState { store, config });
	info!("listening on {}:{}", bind.0, bind.1);

	HttpServer::new(move || {
		let cors = if cors { Cors::permissive() } else { Cors::default() };
		App::new()
			.wrap(Logger::default())
			.wrap(cors)
			.app_data(state.clone())
			.app_data(web::PayloadConfig::new(100 * 1024 * 1024))
			.configure(routes::configure)
	})
	.bind(bind)?
	.run()
	.await?;
	Ok(())
}
