//! Filesystem-backed naming scopes.
//!
//! A directory can act as a scope whose existing names are its entries, and
//! a whole directory tree can be mapped onto valid, unique prim paths with
//! one scope per directory.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::naming::NameCache;
use crate::scope::{Scope, ScopeError, ScopePath};

/// A directory on disk used as a naming scope.
///
/// Existing prim names are the file stems of the directory entries, so a
/// new name will not clash with `foo.usda` or a `foo/` folder.
#[derive(Debug, Clone)]
pub struct DirScope {
	dir: PathBuf,
	path: ScopePath,
}

impl DirScope {
	pub fn new(dir: impl Into<PathBuf>, path: ScopePath) -> Self {
		Self {
			dir: dir.into(),
			path,
		}
	}
}

impl Scope for DirScope {
	fn path(&self) -> Result<ScopePath, ScopeError> {
		Ok(self.path.clone())
	}

	fn existing_prim_names(&self) -> Vec<String> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(err) => {
				log::warn!("Could not list {}: {}", self.dir.display(), err);
				return Vec::new();
			}
		};

		let mut names: Vec<String> = entries
			.filter_map(|e| e.ok())
			.filter_map(|e| {
				e.path()
					.file_stem()
					.map(|stem| stem.to_string_lossy().into_owned())
			})
			.collect();
		names.sort();
		names
	}
}

/// A filesystem entry and the prim path assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
	/// Path relative to the walked root
	pub source: PathBuf,
	pub prim_path: ScopePath,
	pub is_dir: bool,
}

/// Assign every entry below `root_dir` a valid prim path under `root`.
///
/// Entries are visited in file name order, so the result is deterministic.
/// Names are made unique per parent directory through `cache`; names the
/// cache already holds for those scopes are respected.
pub fn map_tree(root_dir: &Path, root: &ScopePath, cache: &mut NameCache) -> Result<Vec<TreeEntry>> {
	let mut scopes: HashMap<PathBuf, ScopePath> = HashMap::new();
	scopes.insert(root_dir.to_path_buf(), root.clone());

	let mut entries = Vec::new();

	for entry in WalkDir::new(root_dir)
		.min_depth(1)
		.sort_by_file_name()
	{
		let entry = entry.with_context(|| format!("Failed to walk {}", root_dir.display()))?;

		let parent_dir = entry.path().parent().unwrap_or(root_dir);
		let Some(parent) = scopes.get(parent_dir).cloned() else {
			// Parent directory was skipped
			continue;
		};

		let file_name = entry.file_name().as_encoded_bytes();
		let prim_name = cache.prim_name(&parent, file_name)?;
		let prim_path = parent.append_child(&prim_name)?;

		let is_dir = entry.file_type().is_dir();
		if is_dir {
			scopes.insert(entry.path().to_path_buf(), prim_path.clone());
		}

		let source = entry
			.path()
			.strip_prefix(root_dir)
			.unwrap_or(entry.path())
			.to_path_buf();

		entries.push(TreeEntry {
			source,
			prim_path,
			is_dir,
		});
	}

	Ok(entries)
}
