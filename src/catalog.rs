use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::{error::DeckError, store, types::card::CardRecord};

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
	Cache,
	Reference,
}

/// Two-tier card lookup: the small cache first, then the reference set.
/// Cards found only in the reference set are appended to the cache.
pub struct Catalog {
	cache_path:     PathBuf,
	reference_path: PathBuf,
	reference:      Option<Vec<CardRecord>>,
}

impl Catalog {
	pub fn new(cache_path: impl Into<PathBuf>, reference_path: impl Into<PathBuf>) -> Self {
		Self { cache_path: cache_path.into(), reference_path: reference_path.into(), reference: None }
	}

	pub fn cache_path(&self) -> &Path { &self.cache_path }

	pub fn lookup(&mut self, name: &str) -> Result<CardRecord, DeckError> { self.resolve(name).map(|(card, _)| card) }

	/// Finds the first record, in stored order, whose name matches `name`.
	#[instrument(skip(self))]
	pub fn resolve(&mut self, name: &str) -> Result<(CardRecord, Tier), DeckError> {
		let cache = self.read_cache()?;
		if let Some(card) = cache.into_iter().find(|card| card.is_named(name)) {
			debug!("Cache hit for {}", name);
			return Ok((card, Tier::Cache));
		}

		let found = self.reference()?.iter().find(|card| card.is_named(name)).cloned();
		match found {
			Some(card) => {
				info!("Caching {} from the reference set", card.name());
				store::append_record(&self.cache_path, &card)?;
				Ok((card, Tier::Reference))
			}
			None => {
				warn!("Card {} not found", name);
				Err(DeckError::CardNotFound(name.to_string()))
			}
		}
	}

	/// Uniform draw from the cache only.
	#[instrument(skip(self, rng))]
	pub fn lookup_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<CardRecord, DeckError> {
		let mut cache = self.read_cache()?;
		if cache.is_empty() {
			return Err(DeckError::EmptyCache);
		}
		let idx = rng.gen_range(0..cache.len());
		debug!("Drew cache index {} of {}", idx, cache.len());
		Ok(cache.swap_remove(idx))
	}

	pub fn cache_len(&self) -> Result<usize, DeckError> { Ok(self.read_cache()?.len()) }

	/// Replaces the reference set wholesale, e.g. after a bulk download.
	#[instrument(skip(self, bytes))]
	pub fn refresh_reference(&mut self, bytes: &[u8]) -> Result<usize, DeckError> {
		let cards: Vec<CardRecord> = serde_json::from_slice(bytes)
			.map_err(|e| DeckError::Json { path: self.reference_path.clone(), source: e })?;
		store::write_atomic(&self.reference_path, bytes)?;
		info!("Reference set replaced with {} cards", cards.len());
		self.reference = Some(cards);
		Ok(self.reference.as_ref().map_or(0, Vec::len))
	}

	fn read_cache(&self) -> Result<Vec<CardRecord>, DeckError> { store::read_array(&self.cache_path) }

	fn reference(&mut self) -> Result<&[CardRecord], DeckError> {
		if self.reference.is_none() {
			let cards = store::read_array(&self.reference_path)?;
			info!("Loaded {} reference cards", cards.len());
			self.reference = Some(cards);
		}
		Ok(self.reference.as_deref().unwrap_or_default())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rand::{SeedableRng, rngs::StdRng};
	use serde_json::json;
	use tempfile::{TempDir, tempdir};

	use super::*;

	fn catalog(cache: &str, reference: &str) -> (TempDir, Catalog) {
		let dir = tempdir().unwrap();
		let cache_path = dir.path().join("cache.json");
		let reference_path = dir.path().join("oracle.json");
		std::fs::write(&cache_path, cache).unwrap();
		std::fs::write(&reference_path, reference).unwrap();
		(dir, Catalog::new(cache_path, reference_path))
	}

	const REFERENCE: &str = r#"[
		{"name": "Lightning Bolt", "cmc": 1},
		{"name": "Jace, the Mind Sculptor", "cmc": 4},
		{"name": "Fireball", "cmc": 1}
	]"#;

	#[test]
	fn spelling_variants_resolve_to_one_record() {
		let (_dir, mut catalog) = catalog("[]", REFERENCE);
		let first = catalog.lookup("Jace, the Mind Sculptor").unwrap();
		for spelling in ["jace the mind sculptor", "JACE, THE MIND SCULPTOR", "Jace,, the Mind, Sculptor"] {
			assert_eq!(catalog.lookup(spelling).unwrap(), first);
		}
	}

	#[test]
	fn reference_hit_fills_the_cache_once() {
		let (_dir, mut catalog) = catalog("[]", REFERENCE);
		assert_eq!(catalog.cache_len().unwrap(), 0);

		let (card, tier) = catalog.resolve("lightning bolt").unwrap();
		assert_eq!(tier, Tier::Reference);
		assert_eq!(card.field("cmc"), Some(&json!(1)));
		assert_eq!(catalog.cache_len().unwrap(), 1);

		let (again, tier) = catalog.resolve("Lightning Bolt").unwrap();
		assert_eq!(tier, Tier::Cache);
		assert_eq!(again, card);
		assert_eq!(catalog.cache_len().unwrap(), 1);
	}

	#[test]
	fn cache_is_consulted_first() {
		let (_dir, mut catalog) = catalog(r#"[{"name":"Fireball","cmc":99}]"#, REFERENCE);
		let (card, tier) = catalog.resolve("fireball").unwrap();
		assert_eq!(tier, Tier::Cache);
		assert_eq!(card.field("cmc"), Some(&json!(99)));
	}

	#[test]
	fn first_duplicate_in_cache_wins() {
		let (_dir, mut catalog) = catalog(r#"[{"name":"Bolt","v":1},{"name":"bolt","v":2}]"#, "[]");
		assert_eq!(catalog.lookup("BOLT").unwrap().field("v"), Some(&json!(1)));
	}

	#[test]
	fn unknown_card_is_not_found() {
		let (_dir, mut catalog) = catalog("[]", REFERENCE);
		let err = catalog.lookup("Black Lotus").unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(catalog.cache_len().unwrap(), 0);
	}

	#[test]
	fn missing_reference_is_a_storage_fault() {
		let dir = tempdir().unwrap();
		let cache_path = dir.path().join("cache.json");
		std::fs::write(&cache_path, "[]").unwrap();
		let mut catalog = Catalog::new(cache_path, dir.path().join("oracle.json"));
		assert!(catalog.lookup("Bolt").unwrap_err().is_storage_fault());
	}

	#[test]
	fn random_draw_needs_a_cache() {
		let (_dir, catalog) = catalog("[]", REFERENCE);
		let mut rng = StdRng::seed_from_u64(1);
		assert!(matches!(catalog.lookup_random(&mut rng), Err(DeckError::EmptyCache)));
	}

	#[test]
	fn random_draw_is_roughly_uniform() {
		let (_dir, catalog) = catalog(r#"[{"name":"a"},{"name":"b"},{"name":"c"},{"name":"d"}]"#, "[]");
		let mut rng = StdRng::seed_from_u64(7);
		let mut counts = std::collections::HashMap::new();
		for _ in 0..4000 {
			let card = catalog.lookup_random(&mut rng).unwrap();
			*counts.entry(card.name().to_string()).or_insert(0u32) += 1;
		}
		assert_eq!(counts.len(), 4);
		for (name, count) in counts {
			assert!((800..1200).contains(&count), "{name} drawn {count} times");
		}
	}

	#[test]
	fn seeded_draws_repeat() {
		let (_dir, catalog) = catalog(r#"[{"name":"a"},{"name":"b"},{"name":"c"}]"#, "[]");
		let draw = |seed| {
			let mut rng = StdRng::seed_from_u64(seed);
			(0..5).map(|_| catalog.lookup_random(&mut rng).unwrap().name().to_string()).collect::<Vec<_>>()
		};
		assert_eq!(draw(42), draw(42));
	}

	#[test]
	fn refresh_replaces_reference_set() {
		let (dir, mut catalog) = catalog("[]", REFERENCE);
		assert!(catalog.lookup("Counterspell").is_err());

		let count = catalog.refresh_reference(br#"[{"name":"Counterspell"}]"#).unwrap();
		assert_eq!(count, 1);
		assert_eq!(catalog.lookup("counterspell").unwrap().name(), "Counterspell");
		assert!(catalog.lookup("Lightning Bolt").is_err());

		let on_disk = std::fs::read_to_string(dir.path().join("oracle.json")).unwrap();
		assert_eq!(on_disk, r#"[{"name":"Counterspell"}]"#);
	}

	#[test]
	fn refresh_rejects_garbage() {
		let (dir, mut catalog) = catalog("[]", REFERENCE);
		assert!(catalog.refresh_reference(b"<html>").is_err());
		assert_eq!(std::fs::read_to_string(dir.path().join("oracle.json")).unwrap(), REFERENCE);
	}
}
