use std::{collections::HashMap, fmt, path::{Path, PathBuf}};

use fs_err as fs;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::{catalog::Catalog, error::DeckError, name, request::{self, CardRequest}, store, types::{card::CardRecord, config::Config}};

const DECK_SUFFIX: &str = ".json";

/// One line of a deck listing: a card and how many copies the deck holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
	pub name:     String,
	pub quantity: usize,
}

impl fmt::Display for DeckEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.quantity == 1 { write!(f, "{}", self.name) } else { write!(f, "{} x{}", self.name, self.quantity) }
	}
}

/// A deck as shown on screen: total card count followed by the grouped entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckView {
	pub total:   usize,
	pub entries: Vec<DeckEntry>,
}

impl fmt::Display for DeckView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{} cards", self.total)?;
		writeln!(f)?;
		for entry in &self.entries {
			writeln!(f, "{}", entry)?;
		}
		Ok(())
	}
}

/// Outcome of adding a list of card requests to a deck.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
	pub requested: usize,
	pub added:     usize,
	pub missing:   Vec<String>,
}

/// Groups records by normalized name, keeping the first spelling seen, and
/// sorts the groups by that spelling.
pub fn aggregate_records(records: &[CardRecord]) -> Vec<DeckEntry> {
	let mut index: HashMap<String, usize> = HashMap::new();
	let mut entries: Vec<DeckEntry> = Vec::new();

	for record in records {
		let key = name::normalize(record.name());
		match index.get(&key) {
			Some(&idx) => entries[idx].quantity += 1,
			None => {
				index.insert(key, entries.len());
				entries.push(DeckEntry { name: record.name().to_string(), quantity: 1 });
			}
		}
	}

	entries.sort_by(|a, b| a.name.cmp(&b.name));
	entries
}

/// Picks `min(hand_size, deck.len())` distinct indices by redrawing any index
/// already taken. Returned in draw order.
pub fn draw_distinct<R: Rng + ?Sized>(deck_len: usize, hand_size: usize, rng: &mut R) -> Vec<usize> {
	let hand_size = hand_size.min(deck_len);
	let mut chosen = Vec::with_capacity(hand_size);
	while chosen.len() < hand_size {
		let candidate = rng.gen_range(0..deck_len);
		if !chosen.contains(&candidate) {
			chosen.push(candidate);
		}
	}
	chosen
}

/// Decks are JSON arrays of full card records, one `<name>.json` file per
/// deck inside a single directory that also holds the metadata record.
pub struct DeckStore {
	decks_dir:     PathBuf,
	metadata_file: String,
	hand_size:     usize,
}

impl DeckStore {
	pub fn new(decks_dir: impl Into<PathBuf>, metadata_file: impl Into<String>) -> Self {
		Self { decks_dir: decks_dir.into(), metadata_file: metadata_file.into(), hand_size: 7 }
	}

	pub fn from_config(config: &Config) -> Self {
		Self::new(config.decks_path(), config.metadata_file.clone()).with_hand_size(config.hand_size)
	}

	pub fn with_hand_size(mut self, hand_size: usize) -> Self {
		self.hand_size = hand_size;
		self
	}

	/// Deck names are used verbatim as file names, so anything that would
	/// leave the deck directory or shadow the metadata record is refused.
	pub fn deck_path(&self, deck: &str) -> Result<PathBuf, DeckError> {
		let invalid = deck.is_empty()
			|| deck.starts_with('.')
			|| deck.contains(['/', '\\', '\0'])
			|| deck == self.metadata_file;
		if invalid {
			return Err(DeckError::InvalidDeckName(deck.to_string()));
		}
		Ok(self.decks_dir.join(format!("{deck}{DECK_SUFFIX}")))
	}

	pub fn exists(&self, deck: &str) -> Result<bool, DeckError> { Ok(self.deck_path(deck)?.is_file()) }

	#[instrument(skip(self))]
	pub fn create_deck(&self, deck: &str) -> Result<(), DeckError> {
		let path = self.deck_path(deck)?;
		if path.exists() {
			warn!("Deck {} already exists", deck);
			return Err(DeckError::DeckExists(deck.to_string()));
		}
		store::write_atomic(&path, b"[]")?;
		info!("Created deck {}", deck);
		Ok(())
	}

	#[instrument(skip(self))]
	pub fn delete_deck(&self, deck: &str) -> Result<(), DeckError> {
		let path = self.deck_path(deck)?;
		if !path.is_file() {
			warn!("Deck {} does not exist", deck);
			return Err(DeckError::DeckNotFound(deck.to_string()));
		}
		fs::remove_file(&path).map_err(|e| DeckError::storage(&path, e))?;
		info!("Deleted deck {}", deck);
		Ok(())
	}

	/// Deck names in directory order, which is not sorted.
	#[instrument(skip(self))]
	pub fn list_decks(&self) -> Result<Vec<String>, DeckError> {
		let entries = fs::read_dir(&self.decks_dir).map_err(|e| DeckError::storage(&self.decks_dir, e))?;

		let mut decks = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| DeckError::storage(&self.decks_dir, e))?;
			let file_name = entry.file_name().to_string_lossy().into_owned();
			if file_name == self.metadata_file || file_name.starts_with('.') {
				continue;
			}
			if let Some(deck) = file_name.strip_suffix(DECK_SUFFIX) {
				decks.push(deck.to_string());
			}
		}

		debug!("Found {} decks", decks.len());
		Ok(decks)
	}

	#[instrument(skip(self))]
	pub fn read_deck(&self, deck: &str) -> Result<Vec<CardRecord>, DeckError> {
		let path = self.deck_path(deck)?;
		store::read_array(&path).map_err(|e| missing_deck(e, deck))
	}

	pub fn deck_size(&self, deck: &str) -> Result<usize, DeckError> { Ok(self.read_deck(deck)?.len()) }

	/// Resolves `card` through the catalog and appends the full record.
	#[instrument(skip(self, catalog))]
	pub fn add_card(&self, catalog: &mut Catalog, card: &str, deck: &str) -> Result<CardRecord, DeckError> {
		let path = self.deck_path(deck)?;
		let record = catalog.lookup(card)?;
		store::append_record(&path, &record).map_err(|e| missing_deck(e, deck))?;
		info!("Added {} to {}", record.name(), deck);
		Ok(record)
	}

	/// Adds `quantity` copies, stopping at the first failure. Copies added
	/// before the failure stay in the deck.
	#[instrument(skip(self, catalog))]
	pub fn add_cards(&self, catalog: &mut Catalog, card: &str, deck: &str, quantity: u32) -> Result<(), DeckError> {
		for _ in 0..quantity {
			self.add_card(catalog, card, deck)?;
		}
		Ok(())
	}

	/// Adds `quantity` random cards from the cache and returns their names.
	#[instrument(skip(self, catalog, rng))]
	pub fn add_random<R: Rng + ?Sized>(
		&self,
		catalog: &Catalog,
		deck: &str,
		quantity: u32,
		rng: &mut R,
	) -> Result<Vec<String>, DeckError> {
		let path = self.deck_path(deck)?;
		let mut added = Vec::new();
		for _ in 0..quantity {
			let record = catalog.lookup_random(rng)?;
			store::append_record(&path, &record).map_err(|e| missing_deck(e, deck))?;
			added.push(record.name().to_string());
		}
		info!("Added {} random cards to {}", added.len(), deck);
		Ok(added)
	}

	/// Removes the first record matching `card` and rewrites the deck. A miss
	/// leaves the file as it was.
	#[instrument(skip(self))]
	pub fn remove_card(&self, card: &str, deck: &str) -> Result<CardRecord, DeckError> {
		let path = self.deck_path(deck)?;
		let mut records = self.read_deck(deck)?;

		let Some(position) = records.iter().position(|record| record.is_named(card)) else {
			warn!("{} is not in {}", card, deck);
			return Err(DeckError::CardNotInDeck { card: card.to_string(), deck: deck.to_string() });
		};

		let removed = records.remove(position);
		store::write_array(&path, &records)?;
		info!("Removed {} from {}", removed.name(), deck);
		Ok(removed)
	}

	/// Removes `quantity` copies, stopping at the first miss.
	#[instrument(skip(self))]
	pub fn remove_cards(&self, card: &str, deck: &str, quantity: u32) -> Result<(), DeckError> {
		for _ in 0..quantity {
			self.remove_card(card, deck)?;
		}
		Ok(())
	}

	/// Removes `old` then adds `new`; nothing is added if the removal fails.
	#[instrument(skip(self, catalog))]
	pub fn replace_card(
		&self,
		catalog: &mut Catalog,
		old: &CardRequest,
		new: &CardRequest,
		deck: &str,
	) -> Result<(), DeckError> {
		self.remove_cards(&old.name, deck, old.quantity)?;
		self.add_cards(catalog, &new.name, deck, new.quantity)
	}

	/// Creates `target` holding a copy of every record in `source`.
	#[instrument(skip(self))]
	pub fn clone_deck(&self, source: &str, target: &str) -> Result<usize, DeckError> {
		let records = self.read_deck(source)?;
		let path = self.deck_path(target)?;
		if path.exists() {
			warn!("Deck {} already exists", target);
			return Err(DeckError::DeckExists(target.to_string()));
		}
		store::write_array(&path, &records)?;
		info!("Cloned {} into {} ({} cards)", source, target, records.len());
		Ok(records.len())
	}

	/// Adds every card request listed in `list`, one per line. Cards the
	/// catalog does not know are reported rather than aborting the import.
	#[instrument(skip(self, catalog))]
	pub fn import_list(&self, catalog: &mut Catalog, list: &Path, deck: &str) -> Result<ImportReport, DeckError> {
		if !self.exists(deck)? {
			return Err(DeckError::DeckNotFound(deck.to_string()));
		}
		let content = fs::read_to_string(list).map_err(|e| DeckError::storage(list, e))?;

		let mut report = ImportReport::default();
		for line in content.lines().filter(|line| !line.trim().is_empty()) {
			let request = request::parse(line.trim_end());
			report.requested += request.quantity as usize;

			for _ in 0..request.quantity {
				match self.add_card(catalog, &request.name, deck) {
					Ok(_) => report.added += 1,
					Err(DeckError::CardNotFound(missing)) => {
						report.missing.push(missing);
						break;
					}
					Err(e) => return Err(e),
				}
			}
		}

		info!("Imported {} of {} cards into {}", report.added, report.requested, deck);
		Ok(report)
	}

	#[instrument(skip(self))]
	pub fn aggregate(&self, deck: &str) -> Result<Vec<DeckEntry>, DeckError> {
		Ok(aggregate_records(&self.read_deck(deck)?))
	}

	#[instrument(skip(self))]
	pub fn view_deck(&self, deck: &str) -> Result<DeckView, DeckError> {
		let records = self.read_deck(deck)?;
		Ok(DeckView { total: records.len(), entries: aggregate_records(&records) })
	}

	/// Writes the aggregated deck to `destination`, one entry per line.
	#[instrument(skip(self))]
	pub fn export_deck(&self, deck: &str, destination: &Path) -> Result<(), DeckError> {
		let entries = self.aggregate(deck)?;
		let text: String = entries.iter().map(|entry| format!("{entry}\n")).collect();
		fs::write(destination, text)
			.map_err(|e| DeckError::ExportFailed { path: destination.to_path_buf(), source: e })?;
		info!("Exported {} to {:?}", deck, destination);
		Ok(())
	}

	/// Draws an opening hand of distinct cards.
	#[instrument(skip(self, rng))]
	pub fn goldfish<R: Rng + ?Sized>(&self, deck: &str, rng: &mut R) -> Result<Vec<String>, DeckError> {
		let records = self.read_deck(deck)?;
		let hand: Vec<String> = draw_distinct(records.len(), self.hand_size, rng)
			.into_iter()
			.map(|idx| records[idx].name().to_string())
			.collect();
		debug!("Drew {:?}", hand);
		Ok(hand)
	}
}

fn missing_deck(err: DeckError, deck: &str) -> DeckError {
	if err.is_missing_file() { DeckError::DeckNotFound(deck.to_string()) } else { err }
}
