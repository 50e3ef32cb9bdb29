//! USD Identifier Naming CLI
//!
//! Encodes and decodes identifiers, and hands out valid, unique prim and
//! property names for a scope or a directory tree.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::ffi::OsString;
use std::io::{self, BufRead};
use std::path::PathBuf;
use usd_names::scope::Scope;
use usd_names::settings::resolve_settings;
use usd_names::tree::{map_tree, DirScope};
use usd_names::writer::{self, Mapping};
use usd_names::{
	decode_all, encode_all, Config, NameCache, NameKind, NameValidator, ScopePath, Siblings,
	TranscodingFormat,
};

#[derive(Parser, Debug)]
#[command(name = "usd-names")]
#[command(version)]
#[command(about = "Make valid, unique USD prim and property names", long_about = None)]
struct Args {
	#[command(subcommand)]
	command: Command,

	/// Substitute illegal characters instead of transcoding
	#[arg(long, global = true)]
	no_transcoding: bool,

	/// Identifier grammar to transcode into: ascii or utf8-xid
	#[arg(long, global = true, value_name = "FORMAT")]
	format: Option<TranscodingFormat>,

	/// Print results as JSON
	#[arg(long, global = true)]
	json: bool,

	/// Print debug logging
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Make names valid identifiers (reads stdin lines when no names are given)
	Encode { names: Vec<OsString> },

	/// Decode transcoded identifiers (reads stdin lines when no names are given)
	Decode { names: Vec<OsString> },

	/// Valid, unique child prim names for a scope
	PrimNames(NamesArgs),

	/// Valid, unique property names for a scope
	PropertyNames(NamesArgs),

	/// Assign a prim path to every entry of a directory tree
	Tree {
		/// Directory to walk
		#[arg(value_name = "DIR")]
		dir: PathBuf,

		/// Prim path the tree is mapped under
		#[arg(long, default_value = "/Root")]
		root: String,
	},
}

#[derive(clap::Args, Debug)]
struct NamesArgs {
	/// Requested names, in order
	#[arg(required = true)]
	names: Vec<String>,

	/// Prim path of the scope
	#[arg(long, default_value = "/World")]
	scope: String,

	/// Comma-separated list of names that already exist in the scope
	#[arg(long, value_delimiter = ',')]
	reserved: Vec<String>,

	/// Directory whose entries count as existing names
	#[arg(long, value_name = "DIR")]
	dir: Option<PathBuf>,
}

fn main() -> Result<()> {
	let args = Args::parse();

	let level = if args.verbose {
		log::LevelFilter::Debug
	} else {
		log::LevelFilter::Warn
	};
	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.init();

	let config = resolve_config(&args)?;
	log::debug!(
		"Transcoding {}, format {}",
		if config.transcoding_enabled { "enabled" } else { "disabled" },
		config.format
	);

	let output = match args.command {
		Command::Encode { names } => {
			let inputs = inputs_or_stdin(names)?;
			let outputs = encode_all(&inputs, &NameValidator::new(config));
			render(&writer::mappings(&lossy(&inputs), &outputs), args.json)?
		}
		Command::Decode { names } => {
			let inputs = lossy(&inputs_or_stdin(names)?);
			let outputs = decode_all(&inputs);
			render(&writer::mappings(&inputs, &outputs), args.json)?
		}
		Command::PrimNames(names) => {
			let mappings = request_names(config, NameKind::Prim, &names)?;
			render(&mappings, args.json)?
		}
		Command::PropertyNames(names) => {
			let mappings = request_names(config, NameKind::Property, &names)?;
			render(&mappings, args.json)?
		}
		Command::Tree { dir, root } => {
			if !dir.is_dir() {
				bail!("Not a directory: {}", dir.display());
			}
			let root = ScopePath::parse(&root)?;
			let mut cache = NameCache::new(config);
			let entries = map_tree(&dir, &root, &mut cache)?;
			if args.json {
				writer::render_tree_json(&entries)? + "\n"
			} else {
				writer::render_tree_text(&entries)
			}
		}
	};

	print!("{}", output);
	Ok(())
}

/// Settings file, then environment, then command line flags.
fn resolve_config(args: &Args) -> Result<Config> {
	let cwd = env::current_dir()?;
	let settings = resolve_settings(&cwd)?;
	if let Some(path) = &settings.settings_path {
		log::debug!("Using settings from {}", path.display());
	}

	let mut config = settings.config;
	if args.no_transcoding {
		config.transcoding_enabled = false;
	}
	if let Some(format) = args.format {
		config.format = format;
	}
	Ok(config)
}

/// Raw input bytes, from the arguments or one per stdin line.
fn inputs_or_stdin(names: Vec<OsString>) -> Result<Vec<Vec<u8>>> {
	if !names.is_empty() {
		return Ok(names.into_iter().map(OsString::into_encoded_bytes).collect());
	}
	let mut lines = Vec::new();
	for line in io::stdin().lock().split(b'\n') {
		let mut line = line?;
		if line.last() == Some(&b'\r') {
			line.pop();
		}
		lines.push(line);
	}
	Ok(lines)
}

fn lossy(inputs: &[Vec<u8>]) -> Vec<String> {
	inputs
		.iter()
		.map(|input| String::from_utf8_lossy(input).into_owned())
		.collect()
}

fn request_names(config: Config, kind: NameKind, args: &NamesArgs) -> Result<Vec<Mapping>> {
	let path = ScopePath::parse(&args.scope)?;

	let mut existing = args.reserved.clone();
	if let Some(dir) = &args.dir {
		existing.extend(DirScope::new(dir, path.clone()).existing_prim_names());
	}
	let scope = Siblings::new(path)
		.with_prims(existing.iter().cloned())
		.with_properties(existing);

	let mut cache = NameCache::new(config);
	let outputs = match kind {
		NameKind::Prim => cache.prim_names(&scope, &args.names)?,
		NameKind::Property => cache.property_names(&scope, &args.names)?,
	};
	Ok(writer::mappings(&args.names, &outputs))
}

fn render(mappings: &[Mapping], json: bool) -> Result<String> {
	if json {
		Ok(writer::render_json(mappings)? + "\n")
	} else {
		Ok(writer::render_text(mappings))
	}
}
