use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{LyrigenError, Result};
use crate::model::multigram_model::MultiGramModel;

/// Extension selecting the binary snapshot format.
pub const SNAPSHOT_EXTENSION: &str = "bin";

/// Reads a whole document as UTF-8 text.
///
/// Invalid UTF-8 is reported as `InvalidData`.
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Path of the snapshot saved next to a text model:
/// `models/lyrics.tsv` becomes `models/lyrics.bin`.
///
/// Returns `None` when `model` already has the snapshot extension, since
/// the snapshot would then overwrite the text file.
pub fn snapshot_path(model: &Path) -> Option<PathBuf> {
	if model.extension() == Some(OsStr::new(SNAPSHOT_EXTENSION)) {
		return None;
	}
	Some(model.with_extension(SNAPSHOT_EXTENSION))
}

/// Name a model file is served under: its file stem, `"model"` if it has none.
pub fn model_name(path: &Path) -> String {
	path.file_stem()
		.map_or_else(|| "model".to_owned(), |stem| stem.to_string_lossy().into_owned())
}

/// Lists regular files of a directory, sorted by name.
///
/// - Not recursive
/// - Hidden files (leading `.`) are skipped
/// - With `extension`, only files carrying it are returned
pub fn list_files<P: AsRef<Path>>(dir: P, extension: Option<&str>) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if !path.is_file() {
			continue;
		}
		let hidden = path
			.file_name()
			.is_some_and(|name| name.to_string_lossy().starts_with('.'));
		if hidden {
			continue;
		}
		if let Some(extension) = extension {
			if path.extension() != Some(OsStr::new(extension)) {
				continue;
			}
		}
		files.push(path);
	}

	files.sort();
	Ok(files)
}

/// Writes a file through a sibling temporary file renamed into place.
///
/// Readers of `path` see either the previous content or the new one.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
	F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
	let mut tmp_name = path.file_name().unwrap_or_else(|| OsStr::new("model")).to_os_string();
	tmp_name.push(".tmp");
	let tmp_path = path.with_file_name(tmp_name);

	let result = File::create(&tmp_path).and_then(|file| {
		let mut writer = BufWriter::new(file);
		write(&mut writer)?;
		writer.flush()?;
		writer.get_ref().sync_all()
	});
	if let Err(err) = result.and_then(|()| fs::rename(&tmp_path, path)) {
		let _ = fs::remove_file(&tmp_path);
		return Err(LyrigenError::io(err, Some(path.to_path_buf())));
	}
	Ok(())
}

/// Loads a model file, choosing the format from its extension.
///
/// `.bin` files are binary snapshots, anything else is the text format.
pub fn load_model_file<P: AsRef<Path>>(path: P) -> Result<MultiGramModel> {
	let path = path.as_ref();
	if !path.exists() {
		return Err(LyrigenError::InputNotFound { path: path.to_path_buf() });
	}
	if path.extension() == Some(OsStr::new(SNAPSHOT_EXTENSION)) {
		MultiGramModel::load_snapshot(path)
	} else {
		MultiGramModel::load(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn snapshot_sits_next_to_text_model() {
		assert_eq!(snapshot_path(Path::new("models/lyrics.tsv")), Some(PathBuf::from("models/lyrics.bin")));
		assert_eq!(snapshot_path(Path::new("all_grams")), Some(PathBuf::from("all_grams.bin")));
		assert_eq!(snapshot_path(Path::new("models/lyrics.bin")), None);
	}

	#[test]
	fn model_name_is_the_file_stem() {
		assert_eq!(model_name(Path::new("./models/lyrics.tsv")), "lyrics");
		assert_eq!(model_name(Path::new("all_grams.bin")), "all_grams");
		assert_eq!(model_name(Path::new("/")), "model");
	}

	#[test]
	fn list_files_is_sorted_flat_and_filtered() {
		let dir = tempdir().expect("tempdir");
		fs::write(dir.path().join("b.txt"), "b").unwrap();
		fs::write(dir.path().join("a.txt"), "a").unwrap();
		fs::write(dir.path().join("c.md"), "c").unwrap();
		fs::write(dir.path().join(".hidden"), "h").unwrap();
		fs::create_dir(dir.path().join("nested")).unwrap();
		fs::write(dir.path().join("nested").join("d.txt"), "d").unwrap();

		let names = |files: Vec<PathBuf>| -> Vec<String> {
			files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect()
		};
		assert_eq!(names(list_files(dir.path(), None).unwrap()), ["a.txt", "b.txt", "c.md"]);
		assert_eq!(names(list_files(dir.path(), Some("txt")).unwrap()), ["a.txt", "b.txt"]);
	}

	#[test]
	fn atomic_write_replaces_content() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("out.tsv");
		fs::write(&path, "old").unwrap();
		write_atomically(&path, |w| w.write_all(b"new")).unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "new");
		assert!(!dir.path().join("out.tsv.tmp").exists());
	}

	#[test]
	fn failed_write_keeps_previous_file() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("out.tsv");
		fs::write(&path, "old").unwrap();
		let result = write_atomically(&path, |_| Err(io::Error::other("boom")));
		assert!(result.is_err());
		assert_eq!(fs::read_to_string(&path).unwrap(), "old");
	}

	#[test]
	fn load_model_file_dispatches_on_extension() {
		let dir = tempdir().expect("tempdir");
		let mut model = MultiGramModel::new(2).unwrap();
		model.observe(&["hey".to_owned(), "jude".to_owned()]);
		model.save(dir.path().join("m.tsv")).unwrap();
		model.save_snapshot(dir.path().join("m.bin")).unwrap();

		assert_eq!(load_model_file(dir.path().join("m.tsv")).unwrap(), model);
		assert_eq!(load_model_file(dir.path().join("m.bin")).unwrap(), model);
		assert!(matches!(
			load_model_file(dir.path().join("missing.tsv")),
			Err(LyrigenError::InputNotFound { .. })
		));
	}
}
