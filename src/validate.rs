//! Valid and unique prim and property names.
//!
//! [`NameValidator`] turns any preferred name into a legal one, either with
//! the reversible Bootstring transcoder or, when transcoding is disabled or
//! fails, with character substitution. The batch functions additionally
//! make the results unique against a set of reserved names.

use std::collections::HashSet;

use thiserror::Error;

use crate::scope::ScopeError;
use crate::substitute::make_valid_identifier_extended;
use crate::transcoding::encode_identifier;
use crate::Config;

/// Separator between the namespaces of a property name.
pub const NAMESPACE_DELIMITER: u8 = b':';

/// Errors returned by name requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
	#[error(transparent)]
	Scope(#[from] ScopeError),

	#[error("no unique name could be found for \"{name}\"")]
	Exhausted { name: String },
}

/// Which kind of name is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
	Prim,
	Property,
}

/// Produces valid names according to a [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NameValidator {
	config: Config,
}

impl NameValidator {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Make `input` a valid identifier.
	///
	/// Never fails: when the transcoder cannot encode the input (invalid
	/// UTF-8, overflow) the substitution fallback is used instead.
	pub fn make_valid_identifier(&self, input: &[u8]) -> String {
		if !self.config.transcoding_enabled {
			return make_valid_identifier_extended(input);
		}
		match encode_identifier(input, self.config.format) {
			Ok(encoded) => encoded,
			Err(err) => {
				log::info!(
					"Bootstring encoding of \"{}\" failed ({}). Resorting to character substitution.",
					String::from_utf8_lossy(input),
					err
				);
				make_valid_identifier_extended(input)
			}
		}
	}

	/// A valid prim name for `name`.
	pub fn prim_name(&self, name: impl AsRef<[u8]>) -> String {
		self.make_valid_identifier(name.as_ref())
	}

	/// A valid property name for `name`.
	///
	/// Every `:` separated namespace is validated on its own; empty
	/// namespaces are validated as empty names.
	pub fn property_name(&self, name: impl AsRef<[u8]>) -> String {
		let separator = char::from(NAMESPACE_DELIMITER).to_string();
		name.as_ref()
			.split(|&b| b == NAMESPACE_DELIMITER)
			.map(|token| self.make_valid_identifier(token))
			.collect::<Vec<_>>()
			.join(&separator)
	}

	/// A valid name of the given kind.
	pub fn name(&self, kind: NameKind, name: &[u8]) -> String {
		match kind {
			NameKind::Prim => self.prim_name(name),
			NameKind::Property => self.property_name(name),
		}
	}

	/// Valid prim names, unique among themselves and against `reserved`.
	pub fn prim_names<N, R>(&self, names: &[N], reserved: &[R]) -> Result<Vec<String>, NameError>
	where
		N: AsRef<[u8]>,
		R: AsRef<str>,
	{
		let mut reserved = reserved.iter().map(|r| r.as_ref().to_string()).collect();
		self.unique_names(NameKind::Prim, names, &mut reserved)
	}

	/// Valid property names, unique among themselves and against `reserved`.
	pub fn property_names<N, R>(&self, names: &[N], reserved: &[R]) -> Result<Vec<String>, NameError>
	where
		N: AsRef<[u8]>,
		R: AsRef<str>,
	{
		let mut reserved = reserved.iter().map(|r| r.as_ref().to_string()).collect();
		self.unique_names(NameKind::Property, names, &mut reserved)
	}

	/// Reserve and return a valid name for `name` that is not in `reserved`.
	pub(crate) fn unique_name(
		&self,
		kind: NameKind,
		name: &[u8],
		reserved: &mut HashSet<String>,
	) -> Result<String, NameError> {
		let valid = self.name(kind, name);
		if reserved.insert(valid.clone()) {
			return Ok(valid);
		}
		self.next_free(kind, name, reserved)
			.ok_or_else(|| NameError::Exhausted {
				name: String::from_utf8_lossy(name).into_owned(),
			})
	}

	/// Reserve and return one unique valid name per input, in order.
	///
	/// Preferred names that are valid and free are granted first, then
	/// collisions are resolved in input order. On error every name reserved
	/// by this call is released again.
	pub(crate) fn unique_names<N: AsRef<[u8]>>(
		&self,
		kind: NameKind,
		names: &[N],
		reserved: &mut HashSet<String>,
	) -> Result<Vec<String>, NameError> {
		let mut claimed: Vec<String> = Vec::new();
		let mut granted: Vec<Option<String>> = names
			.iter()
			.map(|name| {
				let valid = self.name(kind, name.as_ref());
				if reserved.insert(valid.clone()) {
					claimed.push(valid.clone());
					Some(valid)
				} else {
					None
				}
			})
			.collect();

		for (slot, name) in granted.iter_mut().zip(names) {
			if slot.is_some() {
				continue;
			}
			match self.next_free(kind, name.as_ref(), reserved) {
				Some(unique) => {
					claimed.push(unique.clone());
					*slot = Some(unique);
				}
				// Unreachable while `next_free` tries `reserved.len() + 1`
				// distinct candidates; kept as the loop bound's failure path.
				None => {
					for released in &claimed {
						reserved.remove(released);
					}
					return Err(NameError::Exhausted {
						name: String::from_utf8_lossy(name.as_ref()).into_owned(),
					});
				}
			}
		}

		Ok(granted.into_iter().flatten().collect())
	}

	/// Find, reserve and return the first free `name_N` for N = 1, 2, ...
	///
	/// The suffix is appended before validation. Candidates are pairwise
	/// distinct, so one of the first `reserved.len() + 1` is always free.
	fn next_free(&self, kind: NameKind, name: &[u8], reserved: &mut HashSet<String>) -> Option<String> {
		let mut candidate = Vec::with_capacity(name.len() + 4);
		for suffix in 1..=reserved.len() + 1 {
			candidate.clear();
			candidate.extend_from_slice(name);
			candidate.extend_from_slice(format!("_{}", suffix).as_bytes());

			let valid = self.name(kind, &candidate);
			if !reserved.contains(&valid) {
				log::debug!(
					"Resolved collision for \"{}\" with \"{}\"",
					String::from_utf8_lossy(name),
					valid
				);
				reserved.insert(valid.clone());
				return Some(valid);
			}
		}
		None
	}
}
