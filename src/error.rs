use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
	#[error("Card '{0}' not found")]
	CardNotFound(String),

	#[error("Deck '{0}' does not exist")]
	DeckNotFound(String),

	#[error("Card '{card}' not found in deck '{deck}'")]
	CardNotInDeck { card: String, deck: String },

	#[error("Deck '{0}' already exists")]
	DeckExists(String),

	#[error("'{0}' is not a usable deck name")]
	InvalidDeckName(String),

	#[error("The card cache is empty")]
	EmptyCache,

	#[error("Default deck counter cannot be incremented any further")]
	CounterOverflow,

	#[error("Failed to access {path:?}: {source}")]
	Storage {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("File {path:?} is not a JSON array: {reason}")]
	Corrupt { path: PathBuf, reason: String },

	#[error("Invalid JSON in {path:?}: {source}")]
	Json {
		path:   PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Cannot export to {path:?}: {source}")]
	ExportFailed {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Configuration error: {0}")]
	Config(String),
}

impl DeckError {
	pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Storage { path: path.into(), source }
	}

	/// True for every flavour of "the thing asked for is not there".
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			Self::CardNotFound(_)
				| Self::DeckNotFound(_)
				| Self::CardNotInDeck { .. }
				| Self::EmptyCache
				| Self::ExportFailed { .. }
		)
	}

	pub fn is_already_exists(&self) -> bool { matches!(self, Self::DeckExists(_)) }

	/// True when the underlying storage failed or holds something unreadable.
	pub fn is_storage_fault(&self) -> bool {
		matches!(self, Self::Storage { .. } | Self::Corrupt { .. } | Self::Json { .. })
	}

	/// True when the failure was a missing file rather than an unreadable one.
	pub(crate) fn is_missing_file(&self) -> bool {
		matches!(self, Self::Storage { source, .. } if source.kind() == io::ErrorKind::NotFound)
	}
}
