use std::path::PathBuf;

use paramtree::param::{ExportOptions, ImageOptions, Registry, Result, write_image};

use crate::cmd::util::heap_traits;

/// Write an image of a freshly created, default-initialized instance.
pub fn run(class_name: String, output: PathBuf, zstd: bool) -> Result<()> {
	let registry = Registry::builtin();
	let class = registry.require(&class_name)?;
	let instance = class.create(heap_traits())?;

	let options = if zstd { ImageOptions::compressed() } else { ImageOptions::default() };
	write_image(&output, &instance, &ExportOptions::everything(), &options)?;
	log::debug!("wrote {} image to {}", class.name(), output.display());

	println!("wrote: {}", output.display());
	println!("class: {}", class.name());
	println!("compression: {}", options.compression.as_str());
	Ok(())
}
