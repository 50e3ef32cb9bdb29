//! Reversible transcoding of arbitrary strings into identifiers.
//!
//! A Bootstring variant: the characters that are legal in the target
//! grammar are kept in order as a literal prefix, the remaining characters
//! are appended as variable-length base-62 deltas that encode both their
//! code point and their insertion position. The output carries the `tn__`
//! marker so it can be told apart from names that were legal to begin
//! with, and it can always be decoded back to the exact input.
//!
//! ```
//! use usd_names::transcoding::{decode_identifier, encode_identifier, TranscodingFormat};
//!
//! let encoded = encode_identifier("1 mesh", TranscodingFormat::Ascii).unwrap();
//! assert_eq!(encoded, "tn__1mesh_c5");
//! assert_eq!(decode_identifier(&encoded), "1 mesh");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::fenwick::Fenwick;

/// Prefix marking a transcoded identifier. Legal as an ASCII and XID start.
pub const BOOTSTRING_PREFIX: &str = "tn__";

/// Separates the literal prefix from the encoded deltas.
pub const BOOTSTRING_DELIMITER: char = '_';

/// Digits below the threshold end a variable-length integer.
pub(crate) const BOOTSTRING_THRESHOLD: u64 = 31;

pub(crate) const BASE62: u64 = 62;

/// Grammar the encoded identifier must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TranscodingFormat {
	/// `[A-Za-z_][A-Za-z0-9_]*`
	#[default]
	Ascii,
	/// Unicode XID_Start / XID_Continue, plus the ASCII identifier characters.
	Utf8Xid,
}

impl TranscodingFormat {
	/// Whether `c` may start an identifier.
	pub fn is_start(self, c: char) -> bool {
		match self {
			TranscodingFormat::Ascii => is_ascii_start(c),
			TranscodingFormat::Utf8Xid => is_ascii_start(c) || unicode_ident::is_xid_start(c),
		}
	}

	/// Whether `c` may appear after the first character of an identifier.
	pub fn is_continue(self, c: char) -> bool {
		match self {
			TranscodingFormat::Ascii => is_ascii_continue(c),
			TranscodingFormat::Utf8Xid => {
				is_ascii_continue(c) || unicode_ident::is_xid_continue(c)
			}
		}
	}
}

impl fmt::Display for TranscodingFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TranscodingFormat::Ascii => f.write_str("ascii"),
			TranscodingFormat::Utf8Xid => f.write_str("utf8-xid"),
		}
	}
}

impl FromStr for TranscodingFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"ascii" => Ok(TranscodingFormat::Ascii),
			"utf8-xid" | "utf8_xid" | "xid" => Ok(TranscodingFormat::Utf8Xid),
			other => Err(format!(
				"unknown identifier format '{}' (expected 'ascii' or 'utf8-xid')",
				other
			)),
		}
	}
}

/// Reasons the Bootstring encoder cannot produce an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
	#[error("input is not valid UTF-8")]
	InvalidUtf8,

	#[error("delta for code point U+{code_point:04X} overflows")]
	Overflow { code_point: u32 },
}

fn is_ascii_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_'
}

fn is_ascii_continue(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `name` is a non-empty identifier under `format`.
pub fn is_valid_identifier(name: &str, format: TranscodingFormat) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) => format.is_start(first) && chars.all(|c| format.is_continue(c)),
		None => false,
	}
}

/// Encode `input` into an identifier legal under `format`.
///
/// Identifiers that are already legal are returned unchanged, unless they
/// start with [`BOOTSTRING_PREFIX`] (those are escaped so that decoding
/// stays exact). Fails on invalid UTF-8 and on delta overflow.
pub fn encode_identifier(
	input: impl AsRef<[u8]>,
	format: TranscodingFormat,
) -> Result<String, TranscodeError> {
	let input = std::str::from_utf8(input.as_ref()).map_err(|_| TranscodeError::InvalidUtf8)?;
	let encoded = encode_bootstring(input, format)?;

	let unchanged = encoded.len() == input.len() + 1
		&& encoded.starts_with(input)
		&& encoded.ends_with(BOOTSTRING_DELIMITER);
	if unchanged
		&& !input.starts_with(BOOTSTRING_PREFIX)
		&& input.chars().next().is_some_and(|c| format.is_start(c))
	{
		return Ok(input.to_string());
	}

	let mut result = String::with_capacity(BOOTSTRING_PREFIX.len() + encoded.len());
	result.push_str(BOOTSTRING_PREFIX);
	result.push_str(&encoded);
	Ok(result)
}

/// Decode an identifier produced by [`encode_identifier`].
///
/// Strings without the marker, and marker-prefixed strings whose payload
/// is not valid encoded data, are returned unchanged.
pub fn decode_identifier(input: &str) -> Cow<'_, str> {
	match input.strip_prefix(BOOTSTRING_PREFIX) {
		Some(payload) => match decode_bootstring(payload) {
			Some(decoded) => Cow::Owned(decoded),
			None => Cow::Borrowed(input),
		},
		None => Cow::Borrowed(input),
	}
}

fn encode_bootstring(input: &str, format: TranscodingFormat) -> Result<String, TranscodeError> {
	let code_points: Vec<char> = input.chars().collect();

	let mut output = String::with_capacity(input.len() + 1);
	let mut tree = Fenwick::new(code_points.len());
	let mut extended: Vec<(u32, usize)> = Vec::new();
	let mut encoded_points: u64 = 0;

	for (position, &c) in code_points.iter().enumerate() {
		if format.is_continue(c) {
			output.push(c);
			tree.increase(position);
			encoded_points += 1;
		} else {
			extended.push((u32::from(c), position));
		}
	}

	if !output.is_empty() {
		output.push(BOOTSTRING_DELIMITER);
	}

	extended.sort_unstable();

	let mut previous: u32 = 0;
	for (code_point, position) in extended {
		let preceding = tree.prefix_sum(position) as u64;
		let delta = u64::from(code_point - previous)
			.checked_mul(encoded_points + 1)
			.and_then(|d| d.checked_add(preceding))
			.ok_or(TranscodeError::Overflow { code_point })?;
		encode_variable_length(&mut output, delta);
		previous = code_point;

		tree.increase(position);
		encoded_points += 1;
	}

	Ok(output)
}

fn decode_bootstring(input: &str) -> Option<String> {
	let code_points: Vec<char> = input.chars().collect();

	// The literal prefix ends at the last delimiter. Base-62 digits never
	// contain it, and a delimiter at position 0 cannot follow a literal.
	let delimiter = code_points
		.iter()
		.rposition(|&c| c == BOOTSTRING_DELIMITER)
		.unwrap_or(0);

	let mut values: Vec<(u32, usize)> = Vec::with_capacity(code_points.len());
	let mut cursor = 0;
	if delimiter > 0 {
		values.extend(
			code_points[..delimiter]
				.iter()
				.enumerate()
				.map(|(position, &c)| (u32::from(c), position)),
		);
		cursor = delimiter + 1;
	}

	let mut code_point: u32 = 0;
	while cursor < code_points.len() {
		let value = decode_variable_length(&code_points, &mut cursor)?;
		let decoded_points = values.len() as u64 + 1;
		let gap = u32::try_from(value / decoded_points).ok()?;
		code_point = code_point.checked_add(gap)?;
		let position = (value % decoded_points) as usize;
		values.push((code_point, position));
	}

	// Resolve insertions last-to-first: every later insertion shifted the
	// positions recorded by the earlier ones.
	let mut tree = Fenwick::new(values.len());
	tree.fill();
	let mut slots: Vec<Option<char>> = vec![None; values.len()];
	for &(value, position) in values.iter().rev() {
		let index = tree.lower_bound(position + 1)?;
		slots[index] = Some(char::from_u32(value)?);
		tree.decrease(index);
	}

	slots.into_iter().collect()
}

/// Append `number` as a variable-length base-62 integer.
pub(crate) fn encode_variable_length(output: &mut String, mut number: u64) {
	let base = BASE62 - BOOTSTRING_THRESHOLD;
	while number >= BOOTSTRING_THRESHOLD {
		let digit = BOOTSTRING_THRESHOLD + (number - BOOTSTRING_THRESHOLD) % base;
		output.push(encode_base62(digit as u8));
		number = (number - BOOTSTRING_THRESHOLD) / base;
	}
	output.push(encode_base62(number as u8));
}

/// Read one variable-length integer starting at `cursor`.
///
/// Returns `None` on a truncated group, a non base-62 character or overflow.
pub(crate) fn decode_variable_length(digits: &[char], cursor: &mut usize) -> Option<u64> {
	let base = BASE62 - BOOTSTRING_THRESHOLD;
	let mut number: u64 = 0;
	let mut weight: u64 = 1;
	loop {
		let c = *digits.get(*cursor)?;
		*cursor += 1;
		let digit = u64::from(decode_base62(c)?);
		number = digit.checked_mul(weight)?.checked_add(number)?;
		if digit < BOOTSTRING_THRESHOLD {
			return Some(number);
		}
		weight = weight.checked_mul(base)?;
	}
}

/// Map a digit value (0-61) to `0-9`, `A-Z`, `a-z`.
pub(crate) fn encode_base62(digit: u8) -> char {
	match digit {
		0..=9 => (b'0' + digit) as char,
		10..=35 => (b'A' + digit - 10) as char,
		_ => (b'a' + digit - 36) as char,
	}
}

/// Inverse of [`encode_base62`].
pub(crate) fn decode_base62(c: char) -> Option<u8> {
	match c {
		'0'..='9' => Some(c as u8 - b'0'),
		'A'..='Z' => Some(c as u8 - b'A' + 10),
		'a'..='z' => Some(c as u8 - b'a' + 36),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn encode_ascii(input: &str) -> String {
		encode_identifier(input, TranscodingFormat::Ascii).unwrap()
	}

	#[test]
	fn test_base62_alphabet_order() {
		assert_eq!(encode_base62(0), '0');
		assert_eq!(encode_base62(9), '9');
		assert_eq!(encode_base62(10), 'A');
		assert_eq!(encode_base62(35), 'Z');
		assert_eq!(encode_base62(36), 'a');
		assert_eq!(encode_base62(61), 'z');

		for digit in 0..62u8 {
			assert_eq!(decode_base62(encode_base62(digit)), Some(digit));
		}
		assert_eq!(decode_base62('_'), None);
		assert_eq!(decode_base62('é'), None);
	}

	#[test]
	fn test_variable_length_groups() {
		let mut out = String::new();
		encode_variable_length(&mut out, 30);
		assert_eq!(out, "U");

		// First digit at or above the threshold continues the group
		let mut out = String::new();
		encode_variable_length(&mut out, 32);
		assert_eq!(out, "W0");

		let digits: Vec<char> = "W0U".chars().collect();
		let mut cursor = 0;
		assert_eq!(decode_variable_length(&digits, &mut cursor), Some(32));
		assert_eq!(decode_variable_length(&digits, &mut cursor), Some(30));
		assert_eq!(cursor, 3);
	}

	#[test]
	fn test_variable_length_rejects_truncated_group() {
		let digits: Vec<char> = "zz".chars().collect();
		let mut cursor = 0;
		assert_eq!(decode_variable_length(&digits, &mut cursor), None);
	}

	#[test]
	fn test_variable_length_rejects_overflow() {
		let digits: Vec<char> = "z".repeat(40).chars().chain(['0']).collect();
		let mut cursor = 0;
		assert_eq!(decode_variable_length(&digits, &mut cursor), None);
	}

	#[test]
	fn test_legal_identifiers_pass_through() {
		assert_eq!(encode_ascii("Hello"), "Hello");
		assert_eq!(encode_ascii("mesh"), "mesh");
		assert_eq!(encode_ascii("_"), "_");
		assert_eq!(encode_ascii("_1"), "_1");
	}

	#[test]
	fn test_known_encodings() {
		assert_eq!(encode_ascii(""), "tn__");
		assert_eq!(encode_ascii("/"), "tn__l0");
		assert_eq!(encode_ascii("#"), "tn__Z0");
		assert_eq!(encode_ascii(" "), "tn__W0");
		assert_eq!(encode_ascii("1"), "tn__1_");
		assert_eq!(encode_ascii("1_mesh"), "tn__1_mesh_");
		assert_eq!(encode_ascii("1 mesh"), "tn__1mesh_c5");
		assert_eq!(encode_ascii("a b"), "tn__ab_Z2");
		assert_eq!(encode_ascii("cube$3"), "tn__cube3_Y6");
		assert_eq!(encode_ascii("sphere%$%#ad@$1"), "tn__spheread1_kAHAJ8jC");
		assert_eq!(encode_ascii("Bäcker"), "tn__Bcker_ah0");
		assert_eq!(encode_ascii("カーテンウォール"), "tn__sxB76l2Y5o0X16");
		assert_eq!(encode_ascii("😍.😸"), "tn__k0zfn7c3");
	}

	#[test]
	fn test_known_decodings() {
		assert_eq!(decode_identifier("tn__"), "");
		assert_eq!(decode_identifier("tn__W0"), " ");
		assert_eq!(decode_identifier("tn__1mesh_c5"), "1 mesh");
		assert_eq!(decode_identifier("tn__sxB76l2Y5o0X16"), "カーテンウォール");
		assert_eq!(decode_identifier("tn___1_cvb0DAd4k7Z1p16"), "カーテンウォール_1");
	}

	#[test]
	fn test_round_trip() {
		let inputs = [
			"",
			"2cats",
			"a b",
			"a  b c",
			"/foo/bar.property[/target].relAttr",
			"/foo/bar{var=sel}",
			"fooØ:münich",
			"カーテンウォール",
			"😍.😸",
			"\u{0}\u{1}\t\n",
			"\u{10FFFF}x\u{10FFFF}",
			"__",
			"trailing_",
		];
		for format in [TranscodingFormat::Ascii, TranscodingFormat::Utf8Xid] {
			for input in inputs {
				let encoded = encode_identifier(input, format).unwrap();
				assert!(
					is_valid_identifier(&encoded, format),
					"{:?} encoded to illegal {:?} ({})",
					input,
					encoded,
					format
				);
				assert_eq!(decode_identifier(&encoded), input, "{}", format);
			}
		}
	}

	#[test]
	fn test_marker_prefixed_input_is_escaped() {
		let encoded = encode_ascii("tn__");
		assert_eq!(encoded, "tn__tn___");
		assert_eq!(decode_identifier(&encoded), "tn__");

		let encoded = encode_ascii("tn__abc");
		assert_ne!(encoded, "tn__abc");
		assert_eq!(decode_identifier(&encoded), "tn__abc");
	}

	#[test]
	fn test_xid_format_keeps_unicode_letters() {
		let format = TranscodingFormat::Utf8Xid;
		assert_eq!(encode_identifier("カーテンウォール", format).unwrap(), "カーテンウォール");
		assert_eq!(encode_identifier("Bäcker", format).unwrap(), "Bäcker");
		assert_eq!(encode_identifier("_1", format).unwrap(), "_1");

		let encoded = encode_identifier("1ä", format).unwrap();
		assert!(encoded.starts_with(BOOTSTRING_PREFIX));
		assert_eq!(decode_identifier(&encoded), "1ä");
	}

	#[test]
	fn test_invalid_utf8_fails() {
		assert_eq!(
			encode_identifier(b"mesh_\xC4", TranscodingFormat::Ascii),
			Err(TranscodeError::InvalidUtf8)
		);
	}

	#[test]
	fn test_decode_leaves_foreign_strings_alone() {
		assert_eq!(decode_identifier("mesh"), "mesh");
		assert_eq!(decode_identifier("tn"), "tn");
		// Marker present, payload is not base-62
		assert_eq!(decode_identifier("tn__-"), "tn__-");
		// Truncated group
		assert_eq!(decode_identifier("tn__abc_z"), "tn__abc_z");
		// Delimiter with no literal prefix before it
		assert_eq!(decode_identifier("tn___zzzzzzzzzzzzzzzzzzzz0"), "tn___zzzzzzzzzzzzzzzzzzzz0");
	}

	#[test]
	fn test_is_valid_identifier() {
		assert!(is_valid_identifier("mesh_1", TranscodingFormat::Ascii));
		assert!(!is_valid_identifier("1mesh", TranscodingFormat::Ascii));
		assert!(!is_valid_identifier("", TranscodingFormat::Ascii));
		assert!(!is_valid_identifier("Bäcker", TranscodingFormat::Ascii));
		assert!(is_valid_identifier("Bäcker", TranscodingFormat::Utf8Xid));
		assert!(is_valid_identifier("_1", TranscodingFormat::Utf8Xid));
	}

	#[test]
	fn test_format_from_str() {
		assert_eq!("ascii".parse(), Ok(TranscodingFormat::Ascii));
		assert_eq!("UTF8-XID".parse(), Ok(TranscodingFormat::Utf8Xid));
		assert!("latin1".parse::<TranscodingFormat>().is_err());
		assert_eq!(TranscodingFormat::Utf8Xid.to_string(), "utf8-xid");
	}
}
