//! JSON array files that are appended to in place. An append edits the
//! document text (drop the closing bracket, add a separator, the new element,
//! and close again) so existing elements keep their exact bytes, and every
//! write lands through a temporary file and a rename so a failed write never
//! leaves a half-written array behind.

use std::{io::Write, path::{Path, PathBuf}};

use fs_err as fs;
use serde::{Serialize, de::{DeserializeOwned, IgnoredAny}};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::DeckError;

#[instrument]
pub fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DeckError> {
	let content = fs::read_to_string(path).map_err(|e| DeckError::storage(path, e))?;
	let items: Vec<T> =
		serde_json::from_str(&content).map_err(|e| DeckError::Json { path: path.to_path_buf(), source: e })?;
	debug!("Read {} elements from {:?}", items.len(), path);
	Ok(items)
}

/// Appends `record` as the last element of the array stored at `path`.
#[instrument(skip(record))]
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<(), DeckError> {
	let content = fs::read_to_string(path).map_err(|e| DeckError::storage(path, e))?;
	let appended = append_to_text(path, &content, record)?;
	write_atomic(path, appended.as_bytes())
}

fn append_to_text<T: Serialize>(path: &Path, content: &str, record: &T) -> Result<String, DeckError> {
	let corrupt = |reason: &str| DeckError::Corrupt { path: path.to_path_buf(), reason: reason.to_string() };

	// Reject anything the edit below would turn into an invalid document.
	serde_json::from_str::<Vec<IgnoredAny>>(content)
		.map_err(|e| DeckError::Json { path: path.to_path_buf(), source: e })?;

	let open = content.trim_end().strip_suffix(']').ok_or_else(|| corrupt("missing closing ']'"))?;
	let inner = open.trim_start().strip_prefix('[').ok_or_else(|| corrupt("missing opening '['"))?;

	let element =
		serde_json::to_string(record).map_err(|e| DeckError::Json { path: path.to_path_buf(), source: e })?;

	let mut text = String::with_capacity(open.len() + element.len() + 3);
	text.push_str(open);
	if !inner.trim().is_empty() {
		text.push_str(",\n");
	}
	text.push_str(&element);
	text.push(']');
	Ok(text)
}

/// Replaces the whole array at `path` with `items`, one element per line.
#[instrument(skip(items))]
pub fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), DeckError> {
	let mut text = String::from("[");
	for (idx, item) in items.iter().enumerate() {
		if idx > 0 {
			text.push_str(",\n");
		}
		let element =
			serde_json::to_string(item).map_err(|e| DeckError::Json { path: path.to_path_buf(), source: e })?;
		text.push_str(&element);
	}
	text.push(']');
	write_atomic(path, text.as_bytes())
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`.
#[instrument(skip(bytes))]
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DeckError> {
	let tmp = temp_sibling(path);

	let written = fs::File::create(&tmp)
		.and_then(|mut file| {
			file.write_all(bytes)?;
			file.sync_all()
		})
		.and_then(|_| fs::rename(&tmp, path));

	written.map_err(|e| {
		if tmp.exists() {
			if let Err(cleanup) = std::fs::remove_file(&tmp) {
				warn!("Could not remove temporary file {:?}: {}", tmp, cleanup);
			}
		}
		DeckError::storage(path, e)
	})
}

fn temp_sibling(path: &Path) -> PathBuf {
	let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
	path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}
