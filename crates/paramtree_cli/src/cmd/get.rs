use std::path::PathBuf;

use paramtree::param::{ExportOptions, Result};

use crate::cmd::print::{PrintOptions, print_value};
use crate::cmd::util::{open_image, print_json};

/// Resolve one dotted field path inside an image and print its value.
pub fn run(path: PathBuf, field: String, json: bool) -> Result<()> {
	let (_, instance) = open_image(&path)?;
	let handle = instance.handle(&field)?;
	let ty = instance.field_type(&handle)?;
	let value = instance.export_field(&handle, &ExportOptions::everything())?;
	let size = instance.array_size(&handle).ok();

	if json {
		return print_json(&serde_json::json!({
			"path": path.display().to_string(),
			"field": handle.to_name(instance.tree()),
			"type": ty.as_str(),
			"size": size,
			"value": value,
		}));
	}

	println!("path: {}", path.display());
	println!("field: {}", handle.to_name(instance.tree()));
	println!("type: {}", ty.as_str());
	if let Some(size) = size {
		println!("size: {size}");
	}
	println!("value:");
	print_value(&value, 2, PrintOptions::default());
	Ok(())
}
