use std::path::{Component, Path, PathBuf};

use actix_web::{HttpResponse, Responder, get, post, put, web};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use lyrigen_core::model::generator::Generator;
use lyrigen_core::model::multigram_model::{ModelStats, MultiGramModel};
use lyrigen_core::model::prediction_input::{DEFAULT_LENGTH, PredictionInput, StartSeed};
use lyrigen_core::model::store::ModelStore;
use lyrigen_core::trainer::{Trainer, TrainerConfig, TrainingSummary};
use lyrigen_core::MAX_ORDER;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// State shared by every worker.
pub struct AppState {
	pub store: ModelStore,
	pub config: ServerConfig,
}

/// Query parameters of `/v1/generate`.
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
	seed: Option<String>,
	rng_seed: Option<u64>,
}

#[derive(Deserialize)]
struct UploadQuery {
	name: Option<String>,
}

/// Body of `/v1/train`.
#[derive(Deserialize)]
struct TrainRequest {
	dir: String,
	max_order: Option<usize>,
	extension: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
	text: String,
	seed: Vec<String>,
	dropped_seed_words: Vec<String>,
	length: usize,
	model_version: u64,
}

#[derive(Serialize)]
struct ModelResponse {
	name: String,
	version: u64,
	stats: ModelStats,
}

#[derive(Serialize)]
struct TrainResponse {
	version: u64,
	persisted: bool,
	summary: TrainingSummary,
}

/// Registers every endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(health)
		.service(get_stats)
		.service(get_generated)
		.service(get_model)
		.service(put_model)
		.service(post_train);
}

#[get("/health")]
async fn health() -> impl Responder {
	HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

/// HTTP GET endpoint `/v1/stats`
///
/// Name, version and statistics of the current model.
#[get("/v1/stats")]
async fn get_stats(data: web::Data<AppState>) -> impl Responder {
	let handle = data.store.current();
	HttpResponse::Ok().json(ModelResponse {
		name: handle.name().to_owned(),
		version: handle.version(),
		stats: handle.model().stats(),
	})
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `length` words after the optional `seed` text. The request
/// keeps the model it started with even if another one is published meanwhile.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<AppState>, query: web::Query<GenerateParams>) -> Result<HttpResponse, ApiError> {
	let length = query.length.unwrap_or(DEFAULT_LENGTH);
	if length == 0 || length > data.config.max_length {
		return Err(ApiError::BadRequest(format!("length must be between 1 and {}", data.config.max_length)));
	}

	let handle = data.store.current();
	let input = PredictionInput::new(length, StartSeed::from_text(query.seed.as_deref()));
	let generator = Generator::new(handle.model());
	let generation = match query.rng_seed {
		Some(seed) => generator.generate_with_rng(&input, &mut StdRng::seed_from_u64(seed)),
		None => generator.generate(&input),
	}?;

	Ok(HttpResponse::Ok().json(GenerateResponse {
		text: generation.text(),
		seed: generation.seed,
		dropped_seed_words: generation.dropped_seed_words,
		length,
		model_version: handle.version(),
	}))
}

/// HTTP GET endpoint `/v1/model`
///
/// Downloads the current model in the text format.
#[get("/v1/model")]
async fn get_model(data: web::Data<AppState>) -> impl Responder {
	let handle = data.store.current();
	HttpResponse::Ok()
		.content_type("text/tab-separated-values; charset=utf-8")
		.body(handle.model().to_text())
}

/// HTTP PUT endpoint `/v1/model`
///
/// Replaces the current model with the uploaded text-format body. A body
/// that fails to parse leaves the current model untouched.
#[put("/v1/model")]
async fn put_model(data: web::Data<AppState>, query: web::Query<UploadQuery>, body: String) -> Result<HttpResponse, ApiError> {
	let model = web::block(move || MultiGramModel::from_text(&body)).await??;
	let name = query.name.clone().unwrap_or_else(|| "upload".to_owned());
	let handle = data.store.replace(name, model);

	Ok(HttpResponse::Ok().json(ModelResponse {
		name: handle.name().to_owned(),
		version: handle.version(),
		stats: handle.model().stats(),
	}))
}

/// HTTP POST endpoint `/v1/train`
///
/// Trains on a directory below the corpus root, publishes the result and
/// writes it to the configured model path unless persistence is disabled.
#[post("/v1/train")]
async fn post_train(data: web::Data<AppState>, request: web::Json<TrainRequest>) -> Result<HttpResponse, ApiError> {
	let request = request.into_inner();
	let dir = resolve_corpus_dir(&data.config.corpus_root, &request.dir)?;

	let mut builder = TrainerConfig::builder().max_order(request.max_order.unwrap_or(MAX_ORDER));
	if let Some(extension) = request.extension {
		builder = builder.extension(extension);
	}
	let trainer = Trainer::new(builder.build()?)?;

	let persist_to = (!data.config.no_persist).then(|| data.config.model.clone());
	let (outcome, persisted) = web::block(move || -> Result<_, ApiError> {
		let outcome = trainer.train_directory(&dir)?;
		if let Some(path) = &persist_to {
			outcome.model.save(path)?;
			info!("trained model saved to {}", path.display());
		}
		Ok((outcome, persist_to.is_some()))
	})
	.await??;

	let handle = data.store.replace(request.dir, outcome.model);
	Ok(HttpResponse::Ok().json(TrainResponse { version: handle.version(), persisted, summary: outcome.summary }))
}

/// Joins a client supplied directory to the corpus root, refusing escapes.
fn resolve_corpus_dir(root: &Path, dir: &str) -> Result<PathBuf, ApiError> {
	let relative = Path::new(dir);
	let escapes = relative
		.components()
		.any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
	if dir.trim().is_empty() || escapes {
		warn!("rejected corpus directory {dir:?}");
		return Err(ApiError::BadRequest(format!("invalid corpus directory {dir:?}")));
	}
	Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{App, test as actix_test};
	use serde_json::Value;
	use std::fs;
	use tempfile::tempdir;

	const MODEL: &str = "1\t\ta\t3\n1\t\tb\t4\n1\t\tc\t1\n2\ta\tb\t3\n2\tb\ta\t2\n2\tb\tc\t1\n";

	fn state(root: PathBuf, model: &str) -> web::Data<AppState> {
		let model = MultiGramModel::from_text(model).unwrap();
		web::Data::new(AppState { store: ModelStore::new("test", model), config: ServerConfig::for_tests(root) })
	}

	#[actix_web::test]
	async fn generate_returns_requested_length() {
		let dir = tempdir().unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), MODEL)).configure(configure)).await;

		let req = actix_test::TestRequest::get().uri("/v1/generate?length=4&seed=a%20zebra&rng_seed=3").to_request();
		let body: Value = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["length"], 4);
		assert_eq!(body["seed"], json!(["a"]));
		assert_eq!(body["dropped_seed_words"], json!(["zebra"]));
		assert_eq!(body["model_version"], 1);
		let text = body["text"].as_str().unwrap();
		assert_eq!(text.split(' ').count(), 4);
		assert!(text.starts_with("b"));
	}

	#[actix_web::test]
	async fn generate_rejects_bad_length_and_empty_model() {
		let dir = tempdir().unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), "")).configure(configure)).await;

		let req = actix_test::TestRequest::get().uri("/v1/generate?length=0").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 400);
		let req = actix_test::TestRequest::get().uri("/v1/generate?length=501").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 400);
		let req = actix_test::TestRequest::get().uri("/v1/generate?length=5").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 409);
	}

	#[actix_web::test]
	async fn upload_replaces_model_and_download_round_trips() {
		let dir = tempdir().unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), "")).configure(configure)).await;

		let req = actix_test::TestRequest::put().uri("/v1/model?name=songs").set_payload(MODEL).to_request();
		let body: Value = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["name"], "songs");
		assert_eq!(body["version"], 2);
		assert_eq!(body["stats"]["vocabulary"], 3);

		let req = actix_test::TestRequest::get().uri("/v1/model").to_request();
		let text = actix_test::call_and_read_body(&app, req).await;
		assert_eq!(std::str::from_utf8(&text).unwrap(), MODEL);
	}

	#[actix_web::test]
	async fn malformed_upload_keeps_current_model() {
		let dir = tempdir().unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), MODEL)).configure(configure)).await;

		let req = actix_test::TestRequest::put().uri("/v1/model").set_payload("1\t\ta\n").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 400);

		let req = actix_test::TestRequest::get().uri("/v1/stats").to_request();
		let body: Value = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["version"], 1);
		assert_eq!(body["name"], "test");
	}

	#[actix_web::test]
	async fn train_publishes_new_model() {
		let dir = tempdir().unwrap();
		fs::create_dir(dir.path().join("songs")).unwrap();
		fs::write(dir.path().join("songs").join("one.txt"), "la di da la di").unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), "")).configure(configure)).await;

		let req = actix_test::TestRequest::post().uri("/v1/train").set_json(json!({ "dir": "songs", "max_order": 2 })).to_request();
		let body: Value = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["version"], 2);
		assert_eq!(body["persisted"], false);
		assert_eq!(body["summary"]["documents_loaded"], 1);
		assert_eq!(body["summary"]["stats"]["vocabulary"], 3);

		let req = actix_test::TestRequest::get().uri("/v1/generate?length=2&seed=la&rng_seed=1").to_request();
		let body: Value = actix_test::call_and_read_body_json(&app, req).await;
		assert!(body["text"].as_str().unwrap().starts_with("di"));
	}

	#[actix_web::test]
	async fn train_rejects_escaping_and_missing_dirs() {
		let dir = tempdir().unwrap();
		let app = actix_test::init_service(App::new().app_data(state(dir.path().to_path_buf(), "")).configure(configure)).await;

		let req = actix_test::TestRequest::post().uri("/v1/train").set_json(json!({ "dir": "../etc" })).to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 400);
		let req = actix_test::TestRequest::post().uri("/v1/train").set_json(json!({ "dir": "absent" })).to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), 404);
	}

	#[test]
	fn corpus_dir_must_stay_below_root() {
		let root = Path::new("/srv/corpus");
		assert_eq!(resolve_corpus_dir(root, "songs").unwrap(), root.join("songs"));
		assert!(resolve_corpus_dir(root, "/etc").is_err());
		assert!(resolve_corpus_dir(root, "a/../../b").is_err());
		assert!(resolve_corpus_dir(root, " ").is_err());
	}
}
