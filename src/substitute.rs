//! Character substitution fallback for identifier validation.
//!
//! Used when transcoding is disabled or the Bootstring encoder fails.
//! Not reversible.

/// Make `input` a valid ASCII identifier by substituting illegal bytes.
///
/// - Empty input becomes `_`
/// - A leading digit is kept and prefixed with `_`
/// - Every other byte outside `[A-Za-z0-9_]` becomes `_`
///
/// Works on bytes, so multi-byte and malformed UTF-8 sequences produce one
/// `_` per byte.
pub fn make_valid_identifier_extended(input: &[u8]) -> String {
	let Some((&first, rest)) = input.split_first() else {
		return "_".to_string();
	};

	let mut result = String::with_capacity(input.len() + 1);

	if first.is_ascii_digit() {
		result.push('_');
		result.push(first as char);
	} else if first.is_ascii_alphabetic() || first == b'_' {
		result.push(first as char);
	} else {
		result.push('_');
	}

	for &byte in rest {
		if byte.is_ascii_alphanumeric() || byte == b'_' {
			result.push(byte as char);
		} else {
			result.push('_');
		}
	}

	result
}
