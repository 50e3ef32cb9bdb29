//! USD Identifier Naming Library
//!
//! Turns arbitrary strings into valid USD prim and property names and keeps
//! them unique among their siblings. Names are made valid with a reversible
//! Bootstring transcoding (`tn__` prefix) or, when transcoding is disabled,
//! by substituting illegal characters.

mod fenwick;
pub mod naming;
pub mod scope;
pub mod settings;
pub mod substitute;
pub mod transcoding;
pub mod tree;
pub mod validate;
pub mod writer;

use rayon::prelude::*;

pub use naming::NameCache;
pub use scope::{Scope, ScopeError, ScopePath, Siblings};
pub use transcoding::{
	decode_identifier, encode_identifier, is_valid_identifier, TranscodeError, TranscodingFormat,
};
pub use validate::{NameError, NameKind, NameValidator};

/// Configuration for name validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// Whether illegal names are transcoded (otherwise substituted)
	pub transcoding_enabled: bool,
	/// Identifier grammar the transcoder targets
	pub format: TranscodingFormat,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			transcoding_enabled: true,
			format: TranscodingFormat::Ascii,
		}
	}
}

/// Make every input a valid identifier, in parallel.
///
/// The result is in input order. No uniqueness is applied.
pub fn encode_all<S>(inputs: &[S], validator: &NameValidator) -> Vec<String>
where
	S: AsRef<[u8]> + Sync,
{
	inputs
		.par_iter()
		.map(|input| validator.make_valid_identifier(input.as_ref()))
		.collect()
}

/// Decode every input, in parallel. Inputs that are not encoded come back
/// unchanged.
pub fn decode_all<S>(inputs: &[S]) -> Vec<String>
where
	S: AsRef<str> + Sync,
{
	inputs
		.par_iter()
		.map(|input| decode_identifier(input.as_ref()).into_owned())
		.collect()
}
