use std::path::Path;
use std::sync::Arc;

use paramtree::param::desc::HintValue;
use paramtree::param::{HeapTraits, Image, ImageOptions, Instance, Registry, Result, Traits};
use serde::Serialize;

pub(crate) fn heap_traits() -> Arc<dyn Traits> {
	Arc::new(HeapTraits)
}

/// Decode an image file and instantiate it against the built-in classes.
pub(crate) fn open_image(path: &Path) -> Result<(Image, Instance)> {
	let raw = std::fs::read(path)?;
	let image = Image::from_bytes(raw, &ImageOptions::default())?;
	let instance = image.instantiate(&Registry::builtin(), &heap_traits())?;
	Ok((image, instance))
}

/// Render a packed `major << 16 | minor` version.
pub(crate) fn format_version(version: u32) -> String {
	format!("{}.{}", version >> 16, version & 0xffff)
}

pub(crate) fn hint_text(value: HintValue) -> String {
	match value {
		HintValue::U64(v) => v.to_string(),
		HintValue::F64(v) => v.to_string(),
		HintValue::Str(v) => format!("\"{v}\""),
	}
}

pub(crate) fn hint_json(value: HintValue) -> serde_json::Value {
	match value {
		HintValue::U64(v) => v.into(),
		HintValue::F64(v) => v.into(),
		HintValue::Str(v) => v.into(),
	}
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
