//! Naming scopes.
//!
//! A scope is the sibling set a generated name has to be unique in. The
//! name cache only needs two things from it: a stable key (an absolute prim
//! path) and, on first use, the names that already exist there.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::transcoding::{is_valid_identifier, TranscodingFormat};

/// Reasons a path cannot be used as a scope key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
	#[error("the empty path is not a valid scope")]
	Empty,

	#[error("\"{0}\" is not an absolute path")]
	Relative(String),

	#[error("\"{0}\" is a property path, not a prim path")]
	PropertyPath(String),

	#[error("\"{0}\" contains a variant selection")]
	VariantSelection(String),

	#[error("\"{path}\" contains the invalid prim name \"{component}\"")]
	InvalidComponent { path: String, component: String },

	#[error("the absolute root path cannot have properties")]
	RootProperties,
}

/// An absolute prim path used as a cache key, e.g. `/World/Geometry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopePath(String);

impl ScopePath {
	/// The absolute root path `/`.
	pub fn root() -> Self {
		ScopePath("/".to_string())
	}

	/// Parse and validate an absolute prim path.
	pub fn parse(path: &str) -> Result<Self, ScopeError> {
		if path.is_empty() {
			return Err(ScopeError::Empty);
		}
		if path.contains('{') || path.contains('}') {
			return Err(ScopeError::VariantSelection(path.to_string()));
		}
		if path.contains('.') {
			return Err(ScopeError::PropertyPath(path.to_string()));
		}
		let Some(relative) = path.strip_prefix('/') else {
			return Err(ScopeError::Relative(path.to_string()));
		};
		if relative.is_empty() {
			return Ok(Self::root());
		}
		for component in relative.split('/') {
			if !is_valid_identifier(component, TranscodingFormat::Utf8Xid) {
				return Err(ScopeError::InvalidComponent {
					path: path.to_string(),
					component: component.to_string(),
				});
			}
		}
		Ok(ScopePath(path.to_string()))
	}

	pub fn is_root(&self) -> bool {
		self.0 == "/"
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Path of the child prim `name`.
	pub fn append_child(&self, name: &str) -> Result<Self, ScopeError> {
		if !is_valid_identifier(name, TranscodingFormat::Utf8Xid) {
			return Err(ScopeError::InvalidComponent {
				path: self.0.clone(),
				component: name.to_string(),
			});
		}
		let path = if self.is_root() {
			format!("/{}", name)
		} else {
			format!("{}/{}", self.0, name)
		};
		Ok(ScopePath(path))
	}
}

impl fmt::Display for ScopePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for ScopePath {
	type Err = ScopeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ScopePath::parse(s)
	}
}

/// Anything that can act as a naming scope.
///
/// The existing-name listings are read once, when the cache first sees the
/// scope, and again only on an explicit update.
pub trait Scope {
	/// Stable cache key. Scopes with equal paths share cache entries.
	fn path(&self) -> Result<ScopePath, ScopeError>;

	/// Names of the child prims that already exist in this scope.
	fn existing_prim_names(&self) -> Vec<String> {
		Vec::new()
	}

	/// Names of the properties that already exist in this scope.
	fn existing_property_names(&self) -> Vec<String> {
		Vec::new()
	}
}

impl Scope for ScopePath {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		Ok(self.clone())
	}
}

impl Scope for str {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		ScopePath::parse(self)
	}
}

impl Scope for String {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		ScopePath::parse(self)
	}
}

impl<S: Scope + ?Sized> Scope for &S {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		(**self).path()
	}

	fn existing_prim_names(&self) -> Vec<String> {
		(**self).existing_prim_names()
	}

	fn existing_property_names(&self) -> Vec<String> {
		(**self).existing_property_names()
	}
}

/// A scope with a fixed listing of existing names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Siblings {
	path: ScopePath,
	prims: Vec<String>,
	properties: Vec<String>,
}

impl Siblings {
	pub fn new(path: ScopePath) -> Self {
		Self {
			path,
			prims: Vec::new(),
			properties: Vec::new(),
		}
	}

	pub fn with_prims<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.prims.extend(names.into_iter().map(Into::into));
		self
	}

	pub fn with_properties<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.properties.extend(names.into_iter().map(Into::into));
		self
	}
}

impl Scope for Siblings {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		Ok(self.path.clone())
	}

	fn existing_prim_names(&self) -> Vec<String> {
		self.prims.clone()
	}

	fn existing_property_names(&self) -> Vec<String> {
		self.properties.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_valid_paths() {
		assert!(ScopePath::parse("/").unwrap().is_root());
		assert_eq!(ScopePath::parse("/World").unwrap().as_str(), "/World");
		assert_eq!(ScopePath::parse("/World/Geo_1").unwrap().as_str(), "/World/Geo_1");
		assert_eq!(ScopePath::parse("/カーテン").unwrap().as_str(), "/カーテン");
	}

	#[test]
	fn test_parse_invalid_paths() {
		assert_eq!(ScopePath::parse(""), Err(ScopeError::Empty));
		assert_eq!(
			ScopePath::parse("relative/path"),
			Err(ScopeError::Relative("relative/path".to_string()))
		);
		assert_eq!(
			ScopePath::parse("/path.property"),
			Err(ScopeError::PropertyPath("/path.property".to_string()))
		);
		assert_eq!(
			ScopePath::parse(".property"),
			Err(ScopeError::PropertyPath(".property".to_string()))
		);
		assert!(matches!(
			ScopePath::parse("/foo{color=red}"),
			Err(ScopeError::VariantSelection(_))
		));
		assert!(matches!(
			ScopePath::parse("/foo{color=red}bar"),
			Err(ScopeError::VariantSelection(_))
		));
		assert!(matches!(
			ScopePath::parse("/foo/"),
			Err(ScopeError::InvalidComponent { .. })
		));
		assert!(matches!(
			ScopePath::parse("/1foo"),
			Err(ScopeError::InvalidComponent { .. })
		));
	}

	#[test]
	fn test_append_child() {
		let root = ScopePath::root();
		let world = root.append_child("World").unwrap();
		assert_eq!(world.as_str(), "/World");
		assert_eq!(world.append_child("tn__1mesh_c5").unwrap().as_str(), "/World/tn__1mesh_c5");
		assert!(world.append_child("a b").is_err());
	}

	#[test]
	fn test_str_and_path_scopes_share_a_key() {
		let from_str = "/World".path().unwrap();
		let from_path = ScopePath::parse("/World").unwrap().path().unwrap();
		assert_eq!(from_str, from_path);
	}

	#[test]
	fn test_siblings_listing() {
		let scope = Siblings::new(ScopePath::root())
			.with_prims(["foo", "bar"])
			.with_properties(vec!["points".to_string()]);
		assert_eq!(scope.existing_prim_names(), vec!["foo", "bar"]);
		assert_eq!(scope.existing_property_names(), vec!["points"]);
		assert!(ScopePath::root().existing_prim_names().is_empty());
	}
}
