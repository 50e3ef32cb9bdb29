//! Writer module for CLI output.
//!
//! Renders name mappings and mapped trees either as aligned plain text or
//! as pretty-printed JSON.

use anyhow::Result;
use serde_json::{json, Value};
use unicode_width::UnicodeWidthStr;

use crate::tree::TreeEntry;

/// An input string and the name produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
	pub input: String,
	pub output: String,
}

impl Mapping {
	pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
		Self {
			input: input.into(),
			output: output.into(),
		}
	}
}

/// Pair up inputs with their outputs, in order.
pub fn mappings<I, O>(inputs: &[I], outputs: &[O]) -> Vec<Mapping>
where
	I: AsRef<str>,
	O: AsRef<str>,
{
	inputs
		.iter()
		.zip(outputs)
		.map(|(input, output)| Mapping::new(input.as_ref(), output.as_ref()))
		.collect()
}

/// Render mappings as two columns, one mapping per line.
///
/// The second column is aligned by terminal display width, so wide
/// characters count as two cells.
pub fn render_text(mappings: &[Mapping]) -> String {
	let rows: Vec<(&str, &str)> = mappings
		.iter()
		.map(|m| (m.input.as_str(), m.output.as_str()))
		.collect();
	render_columns(&rows)
}

/// Render mappings as a JSON array of `{ "input", "output" }` objects.
pub fn render_json(mappings: &[Mapping]) -> Result<String> {
	let items: Vec<Value> = mappings
		.iter()
		.map(|m| {
			json!({
				"input": m.input,
				"output": m.output,
			})
		})
		.collect();
	Ok(serde_json::to_string_pretty(&Value::Array(items))?)
}

/// Render a mapped tree as `source  prim path` lines.
///
/// Directory sources get a trailing `/`.
pub fn render_tree_text(entries: &[TreeEntry]) -> String {
	let sources: Vec<String> = entries.iter().map(source_label).collect();
	let rows: Vec<(&str, &str)> = sources
		.iter()
		.zip(entries)
		.map(|(source, entry)| (source.as_str(), entry.prim_path.as_str()))
		.collect();
	render_columns(&rows)
}

/// Render a mapped tree as a JSON array.
pub fn render_tree_json(entries: &[TreeEntry]) -> Result<String> {
	let items: Vec<Value> = entries
		.iter()
		.map(|e| {
			json!({
				"source": e.source.to_string_lossy(),
				"primPath": e.prim_path.as_str(),
				"isDir": e.is_dir,
			})
		})
		.collect();
	Ok(serde_json::to_string_pretty(&Value::Array(items))?)
}

fn source_label(entry: &TreeEntry) -> String {
	let mut label = entry.source.to_string_lossy().into_owned();
	if entry.is_dir {
		label.push('/');
	}
	label
}

fn render_columns(rows: &[(&str, &str)]) -> String {
	let width = rows.iter().map(|(left, _)| left.width()).max().unwrap_or(0);

	let mut out = String::new();
	for (left, right) in rows {
		out.push_str(left);
		out.push_str(&" ".repeat(width - left.width() + 2));
		out.push_str(right);
		out.push('\n');
	}
	out
}
