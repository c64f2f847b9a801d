//! The default-deck counter and the most recently referenced deck.
//!
//! Callers own a [`DeckContext`] and hand it back to [`MetadataStore::save`]
//! when they want it persisted; nothing in the deck store touches it.

use std::path::PathBuf;

use fs_err as fs;
use tracing::{debug, info, instrument, warn};

use crate::{error::DeckError, store};

const DEFAULT_PREFIX: &str = "deck";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckContext {
	pub default_counter: u32,
	pub recent_deck:     String,
}

impl Default for DeckContext {
	fn default() -> Self { Self { default_counter: 0, recent_deck: format!("{DEFAULT_PREFIX}0") } }
}

impl DeckContext {
	pub fn default_deck_name(&self) -> String { format!("{DEFAULT_PREFIX}{}", self.default_counter) }

	/// Fails with [`DeckError::CounterOverflow`] instead of wrapping.
	pub fn increment_default_counter(&mut self) -> Result<u32, DeckError> {
		self.default_counter = self.default_counter.checked_add(1).ok_or(DeckError::CounterOverflow)?;
		Ok(self.default_counter)
	}

	pub fn recent_deck_name(&self) -> &str { &self.recent_deck }

	pub fn set_recent_deck_name(&mut self, name: impl Into<String>) { self.recent_deck = name.into(); }

	/// Blank input picks the recent deck; anything else becomes the recent deck.
	pub fn choose_deck(&mut self, input: &str) -> String {
		let input = input.trim();
		if input.is_empty() {
			self.recent_deck.clone()
		} else {
			self.set_recent_deck_name(input);
			input.to_string()
		}
	}

	/// `<counter>\n<recent deck>`
	pub fn encode(&self) -> String { format!("{}\n{}", self.default_counter, self.recent_deck) }

	/// Reads both the current layout and the older single-digit one, where the
	/// first character is the counter and the rest is the deck name.
	pub fn decode(text: &str) -> Option<Self> {
		if let Some((counter, recent)) = text.split_once('\n') {
			let counter = counter.trim_end_matches('\r');
			if !counter.is_empty() && counter.bytes().all(|b| b.is_ascii_digit()) {
				let default_counter = counter.parse().ok()?;
				return Some(Self { default_counter, recent_deck: recent.trim_end_matches(['\r', '\n']).to_string() });
			}
		}

		let mut chars = text.chars();
		let default_counter = chars.next()?.to_digit(10)?;
		Some(Self { default_counter, recent_deck: chars.as_str().trim_end_matches(['\r', '\n']).to_string() })
	}
}

pub struct MetadataStore {
	path: PathBuf,
}

impl MetadataStore {
	pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

	/// A missing record reads as a fresh context.
	#[instrument(skip(self))]
	pub fn load(&self) -> Result<DeckContext, DeckError> {
		if !self.path.exists() {
			warn!("No deck metadata at {:?}, starting fresh", self.path);
			return Ok(DeckContext::default());
		}

		let text = fs::read_to_string(&self.path).map_err(|e| DeckError::storage(&self.path, e))?;
		let context = DeckContext::decode(&text).ok_or_else(|| DeckError::Corrupt {
			path:   self.path.clone(),
			reason: "deck metadata does not start with a counter".to_string(),
		})?;
		debug!("Loaded deck metadata {:?}", context);
		Ok(context)
	}

	#[instrument(skip(self))]
	pub fn save(&self, context: &DeckContext) -> Result<(), DeckError> {
		store::write_atomic(&self.path, context.encode().as_bytes())
	}

	pub fn default_deck_name(&self) -> Result<String, DeckError> { Ok(self.load()?.default_deck_name()) }

	/// Leaves the recent deck name as it was.
	#[instrument(skip(self))]
	pub fn increment_default_counter(&self) -> Result<u32, DeckError> {
		let mut context = self.load()?;
		let counter = context.increment_default_counter()?;
		self.save(&context)?;
		info!("Default deck counter is now {}", counter);
		Ok(counter)
	}

	pub fn recent_deck_name(&self) -> Result<String, DeckError> { Ok(self.load()?.recent_deck) }

	/// Leaves the counter as it was.
	#[instrument(skip(self))]
	pub fn set_recent_deck_name(&self, name: &str) -> Result<(), DeckError> {
		let mut context = self.load()?;
		context.set_recent_deck_name(name);
		self.save(&context)
	}
}
