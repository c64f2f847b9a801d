pub mod catalog;
pub mod deck_store;
pub mod error;
pub mod metadata;
pub mod name;
pub mod request;
pub mod store;
pub mod types;

pub use catalog::{Catalog, Tier};
pub use deck_store::{DeckEntry, DeckStore, DeckView, ImportReport};
pub use error::DeckError;
pub use metadata::{DeckContext, MetadataStore};
pub use request::CardRequest;
pub use types::{card::CardRecord, config::Config};

/// Everything a front end needs, built from one [`Config`].
pub struct Workspace {
	pub catalog:  Catalog,
	pub decks:    DeckStore,
	pub metadata: MetadataStore,
}

impl Workspace {
	/// Creates missing directories and files, then wires up the stores.
	#[tracing::instrument(skip(config))]
	pub fn open(config: &Config) -> Result<Self, DeckError> {
		config.bootstrap()?;
		Ok(Self {
			catalog:  Catalog::new(config.cache_path(), config.reference_path()),
			decks:    DeckStore::from_config(config),
			metadata: MetadataStore::new(config.metadata_path()),
		})
	}
}
