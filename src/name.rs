//! Card name equivalence. Two names refer to the same card when they agree
//! after ASCII lowercasing and removal of every comma. Accents and whitespace
//! are compared as-is.

pub fn normalize(name: &str) -> String {
	name.chars().filter(|c| *c != ',').map(|c| c.to_ascii_lowercase()).collect()
}

pub fn same_card(a: &str, b: &str) -> bool {
	let mut left = a.chars().filter(|c| *c != ',');
	let mut right = b.chars().filter(|c| *c != ',');
	loop {
		match (left.next(), right.next()) {
			(None, None) => return true,
			(Some(l), Some(r)) if l.eq_ignore_ascii_case(&r) => continue,
			_ => return false,
		}
	}
}
