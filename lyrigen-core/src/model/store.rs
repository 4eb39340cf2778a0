use std::sync::{Arc, RwLock};

use log::info;

use super::multigram_model::MultiGramModel;

/// One published model, immutable for as long as anybody holds it.
#[derive(Debug)]
pub struct ModelHandle {
	version: u64,
	name: String,
	model: MultiGramModel,
}

impl ModelHandle {
	/// Monotonic version assigned by the store, starting at 1.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Label given when publishing (file name, upload name, ...).
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The model itself.
	pub fn model(&self) -> &MultiGramModel {
		&self.model
	}
}

/// Holds the current model of a serving layer.
///
/// Readers take a reference-counted handle with [`ModelStore::current`] and
/// keep using it for the whole request. [`ModelStore::replace`] swaps the
/// handle in one step: in-flight readers finish on the old model, later
/// readers see the new one, nobody observes a partial table.
///
/// Versions are assigned under the write lock, so the published version
/// only ever grows.
#[derive(Debug)]
pub struct ModelStore {
	current: RwLock<Arc<ModelHandle>>,
}

impl ModelStore {
	/// Creates a store publishing `model` as version 1.
	pub fn new(name: impl Into<String>, model: MultiGramModel) -> Self {
		let handle = ModelHandle { version: 1, name: name.into(), model };
		Self { current: RwLock::new(Arc::new(handle)) }
	}

	/// Returns the currently published handle.
	pub fn current(&self) -> Arc<ModelHandle> {
		match self.current.read() {
			Ok(guard) => Arc::clone(&*guard),
			// A writer only swaps an Arc, the value is always whole.
			Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
		}
	}

	/// Publishes `model` as the next version, returning its handle.
	pub fn replace(&self, name: impl Into<String>, model: MultiGramModel) -> Arc<ModelHandle> {
		let handle = {
			let mut guard = match self.current.write() {
				Ok(guard) => guard,
				Err(poisoned) => poisoned.into_inner(),
			};
			let handle = Arc::new(ModelHandle { version: guard.version + 1, name: name.into(), model });
			*guard = Arc::clone(&handle);
			handle
		};
		info!("published model {:?} as version {}", handle.name, handle.version);
		handle
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread;

	fn model_with(word: &str) -> MultiGramModel {
		let mut model = MultiGramModel::new(1).unwrap();
		model.observe(&[word.to_owned()]);
		model
	}

	#[test]
	fn replace_bumps_version_and_keeps_old_handles_valid() {
		let store = ModelStore::new("first", model_with("old"));
		let before = store.current();
		assert_eq!(before.version(), 1);

		let published = store.replace("second", model_with("new"));
		assert_eq!(published.version(), 2);
		assert_eq!(store.current().name(), "second");
		assert!(store.current().model().contains("new"));

		assert!(before.model().contains("old"));
		assert!(!before.model().contains("new"));
	}

	#[test]
	fn concurrent_replaces_never_move_the_version_back() {
		let store = Arc::new(ModelStore::new("m0", model_with("w0")));
		let writers: Vec<_> = (0..8)
			.map(|t| {
				let store = Arc::clone(&store);
				thread::spawn(move || {
					let mut published = Vec::new();
					for i in 0..50 {
						let handle = store.replace(format!("t{t}-{i}"), model_with(&format!("t{t}w{i}")));
						published.push(handle.version());
						assert!(store.current().version() >= handle.version());
					}
					published
				})
			})
			.collect();

		let mut versions: Vec<u64> = writers.into_iter().flat_map(|w| w.join().expect("writer thread")).collect();
		versions.sort_unstable();
		assert_eq!(versions, (2..=401).collect::<Vec<u64>>());
		assert_eq!(store.current().version(), 401);
	}

	#[test]
	fn concurrent_readers_see_whole_models() {
		let store = Arc::new(ModelStore::new("m0", model_with("w0")));
		let readers: Vec<_> = (0..4)
			.map(|_| {
				let store = Arc::clone(&store);
				thread::spawn(move || {
					let mut last = 0;
					for _ in 0..500 {
						let handle = store.current();
						assert!(handle.version() >= last);
						last = handle.version();
						let expected = format!("w{}", handle.version() - 1);
						assert!(handle.model().contains(&expected));
						assert_eq!(handle.model().vocabulary_size(), 1);
					}
				})
			})
			.collect();

		for i in 1..50 {
			store.replace(format!("m{i}"), model_with(&format!("w{i}")));
		}
		for reader in readers {
			reader.join().expect("reader thread");
		}
	}
}
