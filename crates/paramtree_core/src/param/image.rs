//! Serialized instance images and the in-place packer that turns them back into instances.
//!
//! An image is JSON (optionally zstd-compressed) carrying the class name, version,
//! checksum, and exported value tree. Reading packs every region the image needs into
//! one traits-allocated block and creates each instance in place over it, so containers
//! point into the shared block and are marked not owned.

use std::fs;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::param::compression::{self, Compression};
use crate::param::lookup::align_up;
use crate::param::storage::{ArrayHeader, RefSlot, StringSlot, init_containers, write_slot};
use crate::param::value::export_at;
use crate::param::{
	Block, ClassDescriptor, ClassSchema, ExportOptions, Handle, Instance, NodeId, ParamError, ParamType, Registry, Result, Scalar, Traits, Value,
};

const MAX_DECOMPRESSED_BYTES: usize = 256 * 1024 * 1024;

/// Serialized instance with its class identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
	/// Class name.
	pub class: String,
	/// Class version at export time.
	pub version: u32,
	/// Class checksum at export time, 32 hex digits.
	pub checksum: String,
	/// Exported root struct.
	pub value: Value,
}

/// Controls for reading and writing images.
#[derive(Debug, Clone)]
pub struct ImageOptions {
	/// Encoding applied on write; reads detect it.
	pub compression: Compression,
	/// zstd level used when compressing.
	pub zstd_level: i32,
	/// Maximum decompressed bytes accepted on read.
	pub max_decompressed_bytes: usize,
	/// Pretty-print JSON on write.
	pub pretty: bool,
}

impl Default for ImageOptions {
	fn default() -> Self {
		Self {
			compression: Compression::None,
			zstd_level: 3,
			max_decompressed_bytes: MAX_DECOMPRESSED_BYTES,
			pretty: true,
		}
	}
}

impl ImageOptions {
	/// Preset writing compact zstd-compressed images.
	pub fn compressed() -> Self {
		Self {
			compression: Compression::Zstd,
			pretty: false,
			..Self::default()
		}
	}
}

impl Image {
	/// Export an instance.
	pub fn from_instance(instance: &Instance, options: &ExportOptions) -> Result<Self> {
		Self::capture(instance, options, 0)
	}

	pub(crate) fn capture(instance: &Instance, options: &ExportOptions, depth: u32) -> Result<Self> {
		let class = instance.class();
		Ok(Self {
			class: class.name().to_owned(),
			version: class.version(),
			checksum: class.checksum_hex(),
			value: export_at(instance, Handle::root(), options, depth)?,
		})
	}

	/// Encode as JSON, compressed per `options`.
	pub fn to_bytes(&self, options: &ImageOptions) -> Result<Vec<u8>> {
		let json = if options.pretty {
			serde_json::to_vec_pretty(self)?
		} else {
			serde_json::to_vec(self)?
		};
		compression::encode_bytes(json, options.compression, options.zstd_level)
	}

	/// Decode JSON or zstd-compressed JSON.
	pub fn from_bytes(raw: Vec<u8>, options: &ImageOptions) -> Result<Self> {
		let (mode, json) = compression::decode_bytes(raw, options.max_decompressed_bytes)?;
		log::debug!("decoding image ({} bytes, compression={})", json.len(), mode.as_str());
		Ok(serde_json::from_slice(&json)?)
	}

	/// Create the instance tree this image describes.
	///
	/// Classes resolve through `registry`; a checksum other than the registered class's
	/// fails with `ChecksumMismatch`.
	pub fn instantiate(&self, registry: &Registry, traits: &Arc<dyn Traits>) -> Result<Instance> {
		let mut packer = Packer {
			registry,
			traits,
			bytes: Vec::new(),
			align: 1,
			pointer_fixups: Vec::new(),
			instances: Vec::new(),
		};
		packer.plan_image(self, None)?;
		packer.finish()
	}
}

/// Read and instantiate an image file.
pub fn read_image(path: impl AsRef<Path>, registry: &Registry, traits: &Arc<dyn Traits>, options: &ImageOptions) -> Result<Instance> {
	let raw = fs::read(path.as_ref())?;
	Image::from_bytes(raw, options)?.instantiate(registry, traits)
}

/// Export an instance and write it as an image file.
pub fn write_image(path: impl AsRef<Path>, instance: &Instance, export: &ExportOptions, options: &ImageOptions) -> Result<()> {
	let bytes = Image::from_instance(instance, export)?.to_bytes(options)?;
	fs::write(path.as_ref(), bytes)?;
	Ok(())
}

struct PlannedInstance {
	class: &'static ClassDescriptor,
	offset: usize,
	parent_slot: Option<usize>,
}

struct Packer<'a> {
	registry: &'a Registry,
	traits: &'a Arc<dyn Traits>,
	bytes: Vec<u8>,
	align: usize,
	/// `(slot, target)`: store the address of `target` in the buffer field at `slot`.
	pointer_fixups: Vec<(usize, usize)>,
	/// Pre-order; children always follow their parent.
	instances: Vec<PlannedInstance>,
}

impl Packer<'_> {
	fn plan_image(&mut self, image: &Image, parent_slot: Option<usize>) -> Result<()> {
		let class = self.registry.require(&image.class)?;
		let expected = class.checksum_hex();
		if image.checksum != expected {
			return Err(ParamError::ChecksumMismatch {
				class: image.class.clone(),
				expected,
				found: image.checksum.clone(),
			});
		}
		if image.version != class.version() {
			log::warn!("{} image version {:#x} differs from class version {:#x}", image.class, image.version, class.version());
		}

		let schema = class.definition_tree(self.traits);
		let align = schema.lookup().inline_align().max(class.alignment());
		let offset = self.reserve(schema.inline_size(), align);
		self.init_region(&schema, 0, offset);
		self.instances.push(PlannedInstance { class, offset, parent_slot });
		self.write_value(&schema, 0, offset, &image.value)
	}

	fn write_value(&mut self, schema: &ClassSchema, node: NodeId, at: usize, value: &Value) -> Result<()> {
		let lookup = schema.lookup();
		let entry = *lookup.node(node);
		let def = &schema.tree().nodes()[node];
		let mismatch = |reason: String| ParamError::ImageValue {
			path: def.long_name.to_string(),
			reason,
		};

		match (entry.ty, value) {
			(ParamType::Struct, Value::Struct(fields)) => {
				for (name, field) in fields {
					let (_, child) = schema.tree().child_by_name(node, name).ok_or_else(|| mismatch(format!("unknown field {name}")))?;
					self.write_value(schema, child, at + lookup.node(child).offset, field)?;
				}
			}
			(ParamType::Array, Value::Array(_) | Value::Null) => {
				let items = match value {
					Value::Array(items) => items.as_slice(),
					_ => &[],
				};
				let element = lookup.element(node).ok_or_else(|| mismatch("array without element".into()))?;
				let stride = lookup.node(element).offset;
				if entry.is_dynamic {
					let extent = u32::try_from(items.len()).map_err(|_| mismatch("array too long".into()))?;
					if !items.is_empty() {
						let payload = self.reserve(stride * items.len(), lookup.node(element).align);
						for (idx, item) in items.iter().enumerate() {
							self.init_region(schema, element, payload + idx * stride);
							self.write_value(schema, element, payload + idx * stride, item)?;
						}
						self.pointer_fixups.push((at, payload));
					}
					let header = ArrayHeader {
						buf: None,
						extent,
						element_size: stride as u32,
						owned: false,
					};
					self.put(at, header);
				} else {
					if items.len() > entry.fixed_len {
						return Err(mismatch(format!("{} elements for fixed length {}", items.len(), entry.fixed_len)));
					}
					for (idx, item) in items.iter().enumerate() {
						self.write_value(schema, element, at + idx * stride, item)?;
					}
				}
			}
			(ParamType::String, Value::String(text)) => {
				let len = u32::try_from(text.len()).map_err(|_| mismatch("string too long".into()))?;
				let buf = self.reserve(text.len() + 1, 1);
				self.bytes[buf..buf + text.len()].copy_from_slice(text.as_bytes());
				self.put(
					at,
					StringSlot {
						buf: None,
						len,
						owned: false,
					},
				);
				self.pointer_fixups.push((at, buf));
			}
			(ParamType::Ref, Value::Ref(image)) => {
				if !def.accepts_variant(&image.class) {
					return Err(ParamError::InvalidVariant {
						class: image.class.clone(),
						allowed: def.ref_variants.join(", "),
					});
				}
				self.plan_image(image, Some(at))?;
			}
			(ParamType::Struct | ParamType::String | ParamType::Ref, Value::Null) => {}
			(ty, value) if ty.is_scalar() => {
				let scalar = scalar_from_value(ty, value).ok_or_else(|| mismatch(format!("expected {ty}")))?;
				scalar.write(&mut self.bytes[at..at + entry.size]);
			}
			(ty, _) => return Err(mismatch(format!("expected {ty}"))),
		}
		Ok(())
	}

	fn reserve(&mut self, size: usize, align: usize) -> usize {
		let offset = align_up(self.bytes.len(), align);
		self.bytes.resize(offset + size, 0);
		self.align = self.align.max(align);
		offset
	}

	/// Give fields the image leaves out valid empty containers.
	fn init_region(&mut self, schema: &ClassSchema, node: NodeId, at: usize) {
		let region = &mut self.bytes[at..];
		// SAFETY: the region was just reserved zeroed and is laid out as `node`.
		unsafe { init_containers(schema.lookup(), node, NonNull::from(region).cast::<u8>()) };
	}

	fn put<T>(&mut self, at: usize, value: T) {
		let slot = &mut self.bytes[at..at + size_of::<T>()];
		// SAFETY: `slot` spans `size_of::<T>()` writable bytes.
		unsafe { write_slot(NonNull::from(slot).cast::<u8>(), value) };
	}

	fn finish(self) -> Result<Instance> {
		let mut block = Block::alloc_zeroed(self.traits, self.bytes.len(), self.align)?;
		block.write(0, &self.bytes)?;
		let base = block.as_ptr();
		for &(slot, target) in &self.pointer_fixups {
			// SAFETY: both offsets lie inside the packed bytes; `buf` is the first field of
			// array headers and string slots.
			unsafe { write_slot::<Option<NonNull<u8>>>(base.add(slot), Some(base.add(target))) };
		}

		let block = Arc::new(block);
		let mut created = Vec::with_capacity(self.instances.len());
		for planned in &self.instances {
			// SAFETY: the packer laid out each region with its class's lookup table, fixed up
			// container pointers into the block with `owned` unset, and left reference slots
			// null. Planned regions never overlap.
			let instance = unsafe { planned.class.create_in_place(Arc::clone(self.traits), Arc::clone(&block), planned.offset)? };
			created.push(Some(instance));
		}

		for (idx, planned) in self.instances.iter().enumerate().skip(1).rev() {
			let (Some(child), Some(slot)) = (created[idx].take(), planned.parent_slot) else {
				continue;
			};
			// SAFETY: `slot` is a reference slot inside the parent's region of the block.
			unsafe { write_slot::<RefSlot>(base.add(slot), Some(NonNull::from(Box::leak(Box::new(child))))) };
		}

		log::debug!("packed image into {} bytes for {} instances", block.size(), self.instances.len());
		created
			.first_mut()
			.and_then(Option::take)
			.ok_or_else(|| ParamError::ImageValue {
				path: String::new(),
				reason: "image has no root instance".into(),
			})
	}
}

fn scalar_from_value(ty: ParamType, value: &Value) -> Option<Scalar> {
	match value {
		Value::Bool(flag) if ty == ParamType::Bool => Some(Scalar::Bool(*flag)),
		Value::UInt(number) => Scalar::from_int(ty, i128::from(*number)),
		Value::Int(number) => Scalar::from_int(ty, i128::from(*number)),
		Value::Float(number) => Scalar::from_float(ty, *number),
		Value::Array(items) => {
			let components = items
				.iter()
				.map(|item| match item {
					Value::Float(number) => Some(*number as f32),
					Value::UInt(number) => Some(*number as f32),
					Value::Int(number) => Some(*number as f32),
					_ => None,
				})
				.collect::<Option<Vec<f32>>>()?;
			Scalar::from_components(ty, &components)
		}
		_ => None,
	}
}
