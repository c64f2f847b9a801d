use tracing::{debug, instrument};

/// A card name with the number of copies asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRequest {
	pub name:     String,
	pub quantity: u32,
}

/// Splits `"Lightning Bolt 4"` into the name and a trailing quantity. A
/// missing or non-numeric suffix means one copy of the whole line.
#[instrument]
pub fn parse(request: &str) -> CardRequest {
	if let Some((idx, ws)) = request.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
		let suffix = &request[idx + ws.len_utf8()..];
		if !suffix.is_empty() {
			if let Ok(quantity) = suffix.parse::<u32>() {
				return CardRequest { name: request[..idx].to_string(), quantity };
			}
			debug!("Suffix {:?} is not a quantity", suffix);
		}
	}

	CardRequest { name: request.to_string(), quantity: 1 }
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn req(name: &str, quantity: u32) -> CardRequest { CardRequest { name: name.to_string(), quantity } }

	#[test]
	fn trailing_number_is_quantity() {
		assert_eq!(parse("Lightning Bolt 4"), req("Lightning Bolt", 4));
		assert_eq!(parse("Island\t12"), req("Island", 12));
	}

	#[test]
	fn bare_name_is_one_copy() {
		assert_eq!(parse("Lightning Bolt"), req("Lightning Bolt", 1));
		assert_eq!(parse("Counterspell"), req("Counterspell", 1));
		assert_eq!(parse(""), req("", 1));
	}

	#[test]
	fn non_numeric_suffix_keeps_whole_line() {
		assert_eq!(parse("Counterspell two"), req("Counterspell two", 1));
		assert_eq!(parse("Bolt -3"), req("Bolt -3", 1));
	}

	#[test]
	fn oversized_count_keeps_whole_line() {
		assert_eq!(parse("Bolt 99999999999"), req("Bolt 99999999999", 1));
		assert_eq!(parse("Bolt 4294967295"), req("Bolt", u32::MAX));
	}

	#[test]
	fn trailing_whitespace_keeps_whole_line() {
		assert_eq!(parse("Lightning Bolt "), req("Lightning Bolt ", 1));
	}

	#[test]
	fn only_last_whitespace_splits() {
		assert_eq!(parse("Borrowing 100,000 Arrows 2"), req("Borrowing 100,000 Arrows", 2));
		assert_eq!(parse("4 Bolt"), req("4 Bolt", 1));
	}
}
