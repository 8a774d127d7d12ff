use std::path::PathBuf;

use paramtree::param::{ExportOptions, Image, Result};

use crate::cmd::print::{PrintOptions, print_value};
use crate::cmd::util::{format_version, open_image, print_json};

#[derive(clap::Args)]
pub struct Args {
	pub image: PathBuf,
	#[arg(long)]
	pub json: bool,
	/// Include fields excluded from default output.
	#[arg(long)]
	pub all: bool,
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
	#[arg(long = "max-array")]
	pub max_array: Option<usize>,
	#[arg(long)]
	pub full: bool,
}

/// Read an image, instantiate it, and print the instance's exported values.
pub fn run(args: Args) -> Result<()> {
	let Args {
		image: path,
		json,
		all,
		max_depth,
		max_array,
		full,
	} = args;

	let (_, instance) = open_image(&path)?;
	let export = ExportOptions {
		include_all: all,
		..ExportOptions::default()
	};
	let image = Image::from_instance(&instance, &export)?;

	if json {
		return print_json(&serde_json::json!({
			"path": path.display().to_string(),
			"ref_count": instance.ref_count(),
			"class": image.class,
			"version": format_version(image.version),
			"checksum": image.checksum,
			"value": image.value,
		}));
	}

	let mut print = if full { PrintOptions::unlimited() } else { PrintOptions::default() };
	if let Some(max_depth) = max_depth {
		print.max_print_depth = max_depth;
	}
	if let Some(max_array) = max_array {
		print.max_array_items = max_array;
	}

	println!("path: {}", path.display());
	println!("class: {}", image.class);
	println!("version: {}", format_version(image.version));
	println!("checksum: {}", image.checksum);
	println!("value:");
	print_value(&image.value, 2, print);
	Ok(())
}
