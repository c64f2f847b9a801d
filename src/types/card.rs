use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::name;

/// A card as stored in the cache, the reference set and deck files. Only
/// `name` is interpreted; every other field is carried through untouched and
/// in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct CardRecord {
	fields: Map<String, Value>,
}

impl CardRecord {
	/// Builds a record holding only a name.
	pub fn named(name: impl Into<String>) -> Self {
		let mut fields = Map::new();
		fields.insert("name".to_string(), Value::String(name.into()));
		Self { fields }
	}

	pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
		let key = key.into();
		if key != "name" || value.is_string() {
			self.fields.insert(key, value);
		}
		self
	}

	pub fn name(&self) -> &str { self.fields.get("name").and_then(Value::as_str).unwrap_or_default() }

	pub fn field(&self, key: &str) -> Option<&Value> { self.fields.get(key) }

	pub fn is_named(&self, other: &str) -> bool { name::same_card(self.name(), other) }

	/// The `image_uris.<kind>` link used by the image fetcher, e.g. `"png"`.
	pub fn image_uri(&self, kind: &str) -> Option<&str> {
		self.fields.get("image_uris")?.get(kind)?.as_str()
	}
}

impl TryFrom<Map<String, Value>> for CardRecord {
	type Error = String;

	fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
		match fields.get("name") {
			Some(Value::String(_)) => Ok(Self { fields }),
			Some(other) => Err(format!("card name must be a string, found {other}")),
			None => Err("card record has no \"name\" field".to_string()),
		}
	}
}

impl From<CardRecord> for Map<String, Value> {
	fn from(record: CardRecord) -> Self { record.fields }
}
