use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{error::DeckError, metadata::DeckContext, store};

/// Where the catalog and decks live. Every path except `data_dir` is
/// relative to `data_dir` unless given absolute.
#[derive(Deserialize, Serialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct Config {
	pub data_dir:       PathBuf,
	pub cache_file:     PathBuf,
	pub reference_file: PathBuf,
	pub decks_dir:      PathBuf,
	pub metadata_file:  String,
	pub hand_size:      usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_dir:       PathBuf::from("data"),
			cache_file:     PathBuf::from("cache.json"),
			reference_file: PathBuf::from("oracle.json"),
			decks_dir:      PathBuf::from("decks"),
			metadata_file:  "_details.txt".to_string(),
			hand_size:      7,
		}
	}
}

impl Config {
	/// Loads `path` if it exists; otherwise the defaults.
	#[instrument]
	pub fn load(path: &Path) -> Result<Self, DeckError> {
		if !path.exists() {
			debug!("No config at {:?}, using defaults", path);
			return Ok(Self::default());
		}

		let content = fs::read_to_string(path).map_err(|e| DeckError::storage(path, e))?;
		let config: Config =
			toml::from_str(&content).map_err(|e| DeckError::Config(format!("{}: {}", path.display(), e)))?;

		if config.metadata_file.is_empty() || config.metadata_file.contains(['/', '\\']) {
			return Err(DeckError::Config(format!("metadata_file {:?} must be a plain file name", config.metadata_file)));
		}

		info!("Loaded config from {:?}", path);
		Ok(config)
	}

	/// Config rooted at `data_dir` with default file names.
	pub fn rooted(data_dir: impl Into<PathBuf>) -> Self { Self { data_dir: data_dir.into(), ..Self::default() } }

	pub fn cache_path(&self) -> PathBuf { self.data_dir.join(&self.cache_file) }

	pub fn reference_path(&self) -> PathBuf { self.data_dir.join(&self.reference_file) }

	pub fn decks_path(&self) -> PathBuf { self.data_dir.join(&self.decks_dir) }

	pub fn metadata_path(&self) -> PathBuf { self.decks_path().join(&self.metadata_file) }

	/// Creates the directories, an empty cache and a fresh metadata record
	/// when they are missing. The reference set is never created here.
	#[instrument(skip(self))]
	pub fn bootstrap(&self) -> Result<(), DeckError> {
		let decks = self.decks_path();
		fs::create_dir_all(&decks).map_err(|e| DeckError::storage(&decks, e))?;

		let cache = self.cache_path();
		if !cache.exists() {
			info!("Creating empty cache at {:?}", cache);
			store::write_atomic(&cache, b"[]")?;
		}

		let metadata = self.metadata_path();
		if !metadata.exists() {
			info!("Creating deck metadata at {:?}", metadata);
			store::write_atomic(&metadata, DeckContext::default().encode().as_bytes())?;
		}

		Ok(())
	}
}
