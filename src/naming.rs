//! Cache of reserved names per scope.
//!
//! [`NameCache`] hands out names that are valid and unique among the
//! siblings of a scope. Every name it returns stays reserved, so repeated
//! requests never collide even before anything has been authored.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::scope::{Scope, ScopeError, ScopePath};
use crate::validate::{NameError, NameKind, NameValidator};
use crate::Config;

/// Valid and unique child prim and property names, cached per scope.
///
/// On first use of a scope its reservations are populated from the scope's
/// existing-name listings. Later changes to the scene are not picked up
/// until [`update`](Self::update), [`clear`](Self::clear) or
/// [`forget`](Self::forget) is called.
///
/// Scopes are keyed by path only; names requested for the same path
/// through different providers share reservations.
///
/// Not synchronized. Use one cache per thread; sharing an instance between
/// threads is a precondition violation.
#[derive(Debug, Default)]
pub struct NameCache {
	validator: NameValidator,
	prims: HashMap<ScopePath, HashSet<String>>,
	properties: HashMap<ScopePath, HashSet<String>>,
}

impl NameCache {
	pub fn new(config: Config) -> Self {
		Self {
			validator: NameValidator::new(config),
			prims: HashMap::new(),
			properties: HashMap::new(),
		}
	}

	/// A valid, unique name for a child prim of `scope`.
	pub fn prim_name<S>(&mut self, scope: &S, name: impl AsRef<[u8]>) -> Result<String, NameError>
	where
		S: Scope + ?Sized,
	{
		let result = self.name_in(scope, NameKind::Prim, name.as_ref());
		logged(result, "get prim name")
	}

	/// Valid, unique names for child prims of `scope`, one per input.
	///
	/// Requested names that are free are granted before any collision is
	/// resolved, so a batch can return different names than the same
	/// sequence of [`prim_name`](Self::prim_name) calls.
	pub fn prim_names<S, N>(&mut self, scope: &S, names: &[N]) -> Result<Vec<String>, NameError>
	where
		S: Scope + ?Sized,
		N: AsRef<[u8]>,
	{
		let result = self.names_in(scope, NameKind::Prim, names);
		logged(result, "get prim names")
	}

	/// A valid, unique property name for `scope`.
	pub fn property_name<S>(&mut self, scope: &S, name: impl AsRef<[u8]>) -> Result<String, NameError>
	where
		S: Scope + ?Sized,
	{
		let result = self.name_in(scope, NameKind::Property, name.as_ref());
		logged(result, "get property name")
	}

	/// Valid, unique property names for `scope`, one per input.
	pub fn property_names<S, N>(&mut self, scope: &S, names: &[N]) -> Result<Vec<String>, NameError>
	where
		S: Scope + ?Sized,
		N: AsRef<[u8]>,
	{
		let result = self.names_in(scope, NameKind::Property, names);
		logged(result, "get property names")
	}

	/// Reserve the scope's existing child prim names.
	///
	/// Names reserved earlier stay reserved.
	pub fn update_prim_names<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.update_kind(scope, NameKind::Prim);
		logged(result, "update prim names")
	}

	/// Reserve the scope's existing property names.
	pub fn update_property_names<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.update_kind(scope, NameKind::Property);
		logged(result, "update property names")
	}

	/// Reserve the scope's existing child prim and property names.
	///
	/// The absolute root has no properties, so only its prim names are
	/// updated.
	pub fn update<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.update_kind(scope, NameKind::Prim).and_then(|()| {
			if scope.path()?.is_root() {
				Ok(())
			} else {
				self.update_kind(scope, NameKind::Property)
			}
		});
		logged(result, "update prim and property names")
	}

	/// Release every reserved child prim name of the scope.
	///
	/// The scope stays known to the cache, so its existing names are not
	/// read again.
	pub fn clear_prim_names<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.clear_kind(scope, NameKind::Prim);
		logged(result, "clear prim names")
	}

	/// Release every reserved property name of the scope.
	pub fn clear_property_names<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.clear_kind(scope, NameKind::Property);
		logged(result, "clear property names")
	}

	/// Release every reserved prim and property name of the scope.
	pub fn clear<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = self.clear_kind(scope, NameKind::Prim).and_then(|()| {
			if scope.path()?.is_root() {
				Ok(())
			} else {
				self.clear_kind(scope, NameKind::Property)
			}
		});
		logged(result, "clear prim and property names")
	}

	/// Drop the scope from the cache.
	///
	/// The next request for it reads its existing names again.
	pub fn forget<S: Scope + ?Sized>(&mut self, scope: &S) -> Result<(), NameError> {
		let result = scope.path().map_err(NameError::from).map(|path| {
			self.prims.remove(&path);
			self.properties.remove(&path);
		});
		logged(result, "forget prim and property names")
	}

	/// Names currently reserved in `path`, if the scope has been used.
	pub fn reserved(&self, path: &ScopePath, kind: NameKind) -> Option<&HashSet<String>> {
		match kind {
			NameKind::Prim => self.prims.get(path),
			NameKind::Property => self.properties.get(path),
		}
	}

	/// Whether `name` is reserved in `path`.
	pub fn is_reserved(&self, path: &ScopePath, kind: NameKind, name: &str) -> bool {
		self.reserved(path, kind)
			.is_some_and(|names| names.contains(name))
	}

	fn name_in<S: Scope + ?Sized>(
		&mut self,
		scope: &S,
		kind: NameKind,
		name: &[u8],
	) -> Result<String, NameError> {
		let path = scope_key(scope, kind)?;
		let validator = self.validator;
		let reserved = touch(self.map_for(kind), path, scope, kind);
		validator.unique_name(kind, name, reserved)
	}

	fn names_in<S, N>(&mut self, scope: &S, kind: NameKind, names: &[N]) -> Result<Vec<String>, NameError>
	where
		S: Scope + ?Sized,
		N: AsRef<[u8]>,
	{
		let path = scope_key(scope, kind)?;
		let validator = self.validator;
		let reserved = touch(self.map_for(kind), path, scope, kind);
		validator.unique_names(kind, names, reserved)
	}

	fn update_kind<S: Scope + ?Sized>(&mut self, scope: &S, kind: NameKind) -> Result<(), NameError> {
		let path = scope_key(scope, kind)?;
		let existing = existing_names(scope, kind);
		log::debug!("Reserving {} existing {:?} names in {}", existing.len(), kind, path);
		self.map_for(kind).entry(path).or_default().extend(existing);
		Ok(())
	}

	fn clear_kind<S: Scope + ?Sized>(&mut self, scope: &S, kind: NameKind) -> Result<(), NameError> {
		let path = scope_key(scope, kind)?;
		self.map_for(kind).insert(path, HashSet::new());
		Ok(())
	}

	fn map_for(&mut self, kind: NameKind) -> &mut HashMap<ScopePath, HashSet<String>> {
		match kind {
			NameKind::Prim => &mut self.prims,
			NameKind::Property => &mut self.properties,
		}
	}
}

/// Validate the scope key for `kind`. The absolute root cannot own properties.
fn scope_key<S: Scope + ?Sized>(scope: &S, kind: NameKind) -> Result<ScopePath, ScopeError> {
	let path = scope.path()?;
	if kind == NameKind::Property && path.is_root() {
		return Err(ScopeError::RootProperties);
	}
	Ok(path)
}

fn existing_names<S: Scope + ?Sized>(scope: &S, kind: NameKind) -> Vec<String> {
	match kind {
		NameKind::Prim => scope.existing_prim_names(),
		NameKind::Property => scope.existing_property_names(),
	}
}

/// Reservations for `path`, populated from the scope on first use.
fn touch<'a, S: Scope + ?Sized>(
	map: &'a mut HashMap<ScopePath, HashSet<String>>,
	path: ScopePath,
	scope: &S,
	kind: NameKind,
) -> &'a mut HashSet<String> {
	match map.entry(path) {
		Entry::Occupied(entry) => entry.into_mut(),
		Entry::Vacant(entry) => {
			let existing = existing_names(scope, kind);
			log::debug!(
				"Populating {:?} names in {} with {} existing names",
				kind,
				entry.key(),
				existing.len()
			);
			entry.insert(existing.into_iter().collect())
		}
	}
}

fn logged<T>(result: Result<T, NameError>, action: &str) -> Result<T, NameError> {
	if let Err(err) = &result {
		log::error!("Unable to {}: {}", action, err);
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scope::Siblings;

	fn path(p: &str) -> ScopePath {
		ScopePath::parse(p).unwrap()
	}

	#[test]
	fn test_prim_name_collides_with_previous_result() {
		let mut cache = NameCache::default();
		let parent = path("/path");
		assert_eq!(cache.prim_name(&parent, "foo").unwrap(), "foo");
		assert_eq!(cache.prim_name(&parent, "foo").unwrap(), "foo_1");
		assert_eq!(cache.prim_name(&parent, "foo_1").unwrap(), "foo_1_1");
		assert!(cache.is_reserved(&parent, NameKind::Prim, "foo"));
	}

	#[test]
	fn test_scopes_are_independent() {
		let mut cache = NameCache::default();
		assert_eq!(cache.prim_name("/a", "foo").unwrap(), "foo");
		assert_eq!(cache.prim_name("/b", "foo").unwrap(), "foo");
		assert_eq!(cache.prim_name("/a", "foo").unwrap(), "foo_1");
	}

	#[test]
	fn test_prims_and_properties_are_independent() {
		let mut cache = NameCache::default();
		assert_eq!(cache.prim_name("/a", "foo").unwrap(), "foo");
		assert_eq!(cache.property_name("/a", "foo").unwrap(), "foo");
	}

	#[test]
	fn test_batch_prefers_requested_names() {
		let mut cache = NameCache::default();
		assert_eq!(
			cache.prim_names("/path", &["foo", "foo", "foo_1"]).unwrap(),
			vec!["foo", "foo_2", "foo_1"]
		);
	}

	#[test]
	fn test_existing_names_populate_on_first_use() {
		let mut cache = NameCache::default();
		let parent = Siblings::new(path("/prim")).with_prims(["foo", "foo_1", "foo_2", "foo_3"]);
		assert_eq!(cache.prim_name(&parent, "foo").unwrap(), "foo_4");

		// Later listings are not read without an update
		let parent = Siblings::new(path("/prim")).with_prims(["foo_5"]);
		assert_eq!(cache.prim_name(&parent, "foo_5").unwrap(), "foo_5");
	}

	#[test]
	fn test_update_adds_existing_names() {
		let mut cache = NameCache::default();
		assert_eq!(cache.prim_name("/parent", "test").unwrap(), "test");

		let parent = Siblings::new(path("/parent"))
			.with_prims(["bar"])
			.with_properties(["bar"]);
		cache.update(&parent).unwrap();
		assert_eq!(cache.prim_name(&parent, "bar").unwrap(), "bar_1");
		assert_eq!(cache.property_name(&parent, "bar").unwrap(), "bar_1");
		assert_eq!(cache.prim_name(&parent, "test").unwrap(), "test_1");
	}

	#[test]
	fn test_update_twice_is_harmless() {
		let mut cache = NameCache::default();
		let parent = Siblings::new(path("/parent")).with_prims(["bar"]);
		cache.update_prim_names(&parent).unwrap();
		cache.update_prim_names(&parent).unwrap();
		assert_eq!(cache.reserved(&path("/parent"), NameKind::Prim).unwrap().len(), 1);
		assert_eq!(cache.prim_name(&parent, "bar").unwrap(), "bar_1");
	}

	#[test]
	fn test_clear_keeps_scope_touched() {
		let mut cache = NameCache::default();
		let parent = Siblings::new(path("/parent")).with_prims(["bar"]);
		assert_eq!(cache.prim_name(&parent, "test").unwrap(), "test");

		cache.clear_prim_names(&parent).unwrap();
		assert_eq!(cache.prim_name(&parent, "test").unwrap(), "test");
		// Cleared scopes are not populated again
		assert_eq!(cache.prim_name(&parent, "bar").unwrap(), "bar");
	}

	#[test]
	fn test_forget_repopulates() {
		let mut cache = NameCache::default();
		let parent = Siblings::new(path("/parent")).with_prims(["bar"]);
		assert_eq!(cache.prim_name(&parent, "test").unwrap(), "test");

		cache.forget(&parent).unwrap();
		assert!(cache.reserved(&path("/parent"), NameKind::Prim).is_none());
		assert_eq!(cache.prim_name(&parent, "test").unwrap(), "test");
		assert_eq!(cache.prim_name(&parent, "bar").unwrap(), "bar_1");
	}

	#[test]
	fn test_invalid_scope_fails_without_reserving() {
		let mut cache = NameCache::default();
		assert!(matches!(
			cache.prim_name("relative/path", "foo"),
			Err(NameError::Scope(ScopeError::Relative(_)))
		));
		assert!(cache.prim_name("", "foo").is_err());
		assert!(cache.prim_names("/path.property", &["foo"]).is_err());
		assert!(cache.clear("/foo{color=red}").is_err());
		assert!(cache.prims.is_empty());
	}

	#[test]
	fn test_root_scope() {
		let mut cache = NameCache::default();
		assert_eq!(cache.prim_name("/", "foo").unwrap(), "foo");
		assert_eq!(cache.prim_name(&ScopePath::root(), "foo").unwrap(), "foo_1");
		assert_eq!(
			cache.property_name("/", "foo"),
			Err(NameError::Scope(ScopeError::RootProperties))
		);
		assert!(cache.update("/").is_ok());
		assert!(cache.clear("/").is_ok());
		assert!(cache.clear_property_names("/").is_err());
	}

	#[test]
	fn test_empty_name_is_a_real_name() {
		let mut cache = NameCache::default();
		assert_eq!(cache.prim_name("/a", "").unwrap(), "tn__");
		assert_eq!(cache.prim_name("/a", "").unwrap(), "_1");
	}

	#[test]
	fn test_without_transcoding() {
		let mut cache = NameCache::new(Config {
			transcoding_enabled: false,
			..Config::default()
		});
		assert_eq!(cache.prim_name("/a", "1 mesh").unwrap(), "_1_mesh");
		assert_eq!(cache.prim_name("/a", "1 mesh").unwrap(), "_1_mesh_1");
		assert_eq!(cache.prim_name("/a", b"\xFF".as_slice()).unwrap(), "_");
	}
}
