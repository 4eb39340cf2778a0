//! Document sources feeding the trainer.
//!
//! A source lists document identifiers and reads them one at a time; a
//! failing `read` only loses that document.

use std::path::{Path, PathBuf};

use crate::error::{LyrigenError, Result};
use crate::io::{list_files, read_file};

/// Supplies one text document per call, keyed by an identifier.
pub trait DocumentSource {
	/// Human readable location of the source, used in errors and logs.
	fn location(&self) -> PathBuf;

	/// Identifiers of every candidate document, in training order.
	fn list(&self) -> Result<Vec<String>>;

	/// Reads one document.
	///
	/// # Errors
	/// Any error is treated by the trainer as a per-document failure.
	fn read(&self, id: &str) -> Result<String>;
}

/// Plain-text documents stored directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
	dir: PathBuf,
	extension: Option<String>,
}

impl DirectorySource {
	/// Opens a corpus directory.
	///
	/// # Errors
	/// [`LyrigenError::InputNotFound`] if `dir` does not exist or is not a directory.
	pub fn new<P: AsRef<Path>>(dir: P, extension: Option<String>) -> Result<Self> {
		let dir = dir.as_ref();
		if !dir.is_dir() {
			return Err(LyrigenError::InputNotFound { path: dir.to_path_buf() });
		}
		Ok(Self { dir: dir.to_path_buf(), extension })
	}
}

impl DocumentSource for DirectorySource {
	fn location(&self) -> PathBuf {
		self.dir.clone()
	}

	fn list(&self) -> Result<Vec<String>> {
		let files = list_files(&self.dir, self.extension.as_deref())
			.map_err(|err| LyrigenError::io(err, Some(self.dir.clone())))?;
		Ok(files
			.iter()
			.filter_map(|path| path.file_name())
			.map(|name| name.to_string_lossy().into_owned())
			.collect())
	}

	fn read(&self, id: &str) -> Result<String> {
		let path = self.dir.join(id);
		read_file(&path).map_err(|err| LyrigenError::io(err, Some(path)))
	}
}

/// Documents held in memory, keyed by name. Handy for uploads and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	documents: Vec<(String, String)>,
}

impl MemorySource {
	/// Creates an empty source.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a document.
	pub fn push(&mut self, id: impl Into<String>, text: impl Into<String>) {
		self.documents.push((id.into(), text.into()));
	}
}

impl DocumentSource for MemorySource {
	fn location(&self) -> PathBuf {
		PathBuf::from("<memory>")
	}

	fn list(&self) -> Result<Vec<String>> {
		Ok(self.documents.iter().map(|(id, _)| id.clone()).collect())
	}

	fn read(&self, id: &str) -> Result<String> {
		self.documents
			.iter()
			.find(|(name, _)| name == id)
			.map(|(_, text)| text.clone())
			.ok_or_else(|| LyrigenError::InputNotFound { path: PathBuf::from(id) })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	#[test]
	fn directory_source_lists_and_reads() {
		let dir = tempdir().expect("tempdir");
		fs::write(dir.path().join("song1.txt"), "first").unwrap();
		fs::write(dir.path().join("song2.txt"), "second").unwrap();

		let source = DirectorySource::new(dir.path(), None).unwrap();
		assert_eq!(source.list().unwrap(), ["song1.txt", "song2.txt"]);
		assert_eq!(source.read("song2.txt").unwrap(), "second");
	}

	#[test]
	fn non_utf8_document_fails_to_read() {
		let dir = tempdir().expect("tempdir");
		fs::write(dir.path().join("blob.txt"), [0xffu8, 0xfe, 0x00]).unwrap();
		let source = DirectorySource::new(dir.path(), None).unwrap();
		assert!(source.read("blob.txt").is_err());
	}

	#[test]
	fn missing_directory_is_input_not_found() {
		let dir = tempdir().expect("tempdir");
		let result = DirectorySource::new(dir.path().join("absent"), None);
		assert!(matches!(result, Err(LyrigenError::InputNotFound { .. })));
	}
}
