use std::ptr::NonNull;
use std::sync::Arc;

use crate::param::desc::DefaultDesc;
use crate::param::handle::resolve;
use crate::param::storage::{self, ArrayHeader, RefSlot, read_slot, write_slot};
use crate::param::{
	Block, ClassDescriptor, ClassSchema, DefinitionTree, Handle, NodeId, ParamError, ParamType, ResolvedField, Result, Scalar, ScalarValue, Traits,
};

/// Memory behind an instance's inline region.
#[derive(Debug)]
pub(crate) enum Backing {
	/// Block allocated for this instance alone.
	Owned(Block),
	/// Region inside a block shared with other in-place instances.
	InPlace {
		/// Shared block; released with its last instance.
		block: Arc<Block>,
		/// Region start inside the block.
		offset: usize,
	},
}

/// Snapshot of a dynamic array header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayInfo {
	/// Current element count.
	pub extent: usize,
	/// Element stride in bytes.
	pub element_size: usize,
	/// Element buffer; `None` exactly when `extent == 0`.
	pub buffer: Option<NonNull<u8>>,
	/// Whether the buffer is released by this instance.
	pub owned: bool,
}

/// Concrete object of a parameterized class.
///
/// Inline fields live in traits-allocated memory laid out by the class lookup table.
/// Strings, dynamic arrays, and references are owned out-of-line and released on drop:
/// strings first, then references, then array buffers.
pub struct Instance {
	class: &'static ClassDescriptor,
	schema: Arc<ClassSchema>,
	traits: Arc<dyn Traits>,
	backing: Backing,
}

impl Instance {
	pub(crate) fn new(class: &'static ClassDescriptor, schema: Arc<ClassSchema>, traits: Arc<dyn Traits>, backing: Backing, fresh: bool) -> Result<Self> {
		let mut instance = Self {
			class,
			schema,
			traits,
			backing,
		};
		if fresh {
			// SAFETY: the block was just zeroed and sized for the inline region.
			unsafe { storage::init_containers(instance.schema.lookup(), 0, instance.base()) };
			instance.apply_defaults(0, &Handle::root())?;
		}
		log::debug!("created {} instance (in_place={})", class.name(), !fresh);
		Ok(instance)
	}

	/// Class of this instance.
	pub fn class(&self) -> &'static ClassDescriptor {
		self.class
	}

	/// Class name.
	pub fn class_name(&self) -> &'static str {
		self.class.name()
	}

	/// Schema this instance was created against.
	pub fn schema(&self) -> &Arc<ClassSchema> {
		&self.schema
	}

	/// Definition tree of the class.
	pub fn tree(&self) -> &DefinitionTree {
		self.schema.tree()
	}

	/// Traits owning this instance's memory.
	pub fn traits(&self) -> &Arc<dyn Traits> {
		&self.traits
	}

	/// Whether the inline region was allocated for this instance alone.
	pub fn is_self_allocated(&self) -> bool {
		matches!(self.backing, Backing::Owned(_))
	}

	/// Instances sharing the backing block, including this one.
	pub fn ref_count(&self) -> usize {
		match &self.backing {
			Backing::Owned(_) => 1,
			Backing::InPlace { block, .. } => Arc::strong_count(block),
		}
	}

	/// Destroy the instance, releasing all owned memory.
	pub fn destroy(self) {
		drop(self);
	}

	/// Build a handle for a dotted name and check it against this instance.
	pub fn handle(&self, name: &str) -> Result<Handle> {
		let handle = Handle::parse(self.tree(), name)?;
		self.resolve(&handle)?;
		Ok(handle)
	}

	/// Resolve a handle to the field's address in this instance.
	pub fn resolve(&self, handle: &Handle) -> Result<ResolvedField> {
		// SAFETY: `base` addresses this instance's inline region, laid out by `schema`.
		unsafe { resolve(&self.schema, self.base(), handle) }
	}

	/// Type tag of the field a handle reaches.
	pub fn field_type(&self, handle: &Handle) -> Result<ParamType> {
		Ok(self.resolve_typed(handle, None)?.1)
	}

	/// Read a plain-data field.
	pub fn get_scalar(&self, handle: &Handle) -> Result<Scalar> {
		let (field, ty) = self.resolve_typed(handle, None)?;
		let (size, _) = ty.scalar_layout().ok_or(ParamError::TypeMismatch { expected: "scalar", got: ty })?;
		// SAFETY: scalar nodes occupy `size` bytes at the resolved address.
		let bytes = unsafe { std::slice::from_raw_parts(field.address().as_ptr(), size) };
		Scalar::read(ty, bytes).ok_or(ParamError::TypeMismatch { expected: "scalar", got: ty })
	}

	/// Overwrite a plain-data field; the value's tag must match the field.
	pub fn set_scalar(&mut self, handle: &Handle, value: Scalar) -> Result<()> {
		let (field, ty) = self.resolve_typed(handle, Some(value.ty()))?;
		let (size, _) = ty.scalar_layout().ok_or(ParamError::TypeMismatch { expected: "scalar", got: ty })?;
		// SAFETY: scalar nodes occupy `size` bytes at the resolved address; `&mut self` is unique.
		let bytes = unsafe { std::slice::from_raw_parts_mut(field.address().as_ptr(), size) };
		value.write(bytes);
		Ok(())
	}

	/// Read a field as a Rust scalar type.
	pub fn get<T: ScalarValue>(&self, handle: &Handle) -> Result<T> {
		self.resolve_typed(handle, Some(T::TYPE))?;
		let value = self.get_scalar(handle)?;
		T::from_scalar(value).ok_or(ParamError::TypeMismatch {
			expected: T::TYPE.as_str(),
			got: value.ty(),
		})
	}

	/// Write a field from a Rust scalar type.
	pub fn set<T: ScalarValue>(&mut self, handle: &Handle, value: T) -> Result<()> {
		self.set_scalar(handle, value.into_scalar())
	}

	/// Element count of a fixed or dynamic array.
	pub fn array_size(&self, handle: &Handle) -> Result<usize> {
		let (field, ty) = self.resolve_typed(handle, Some(ParamType::Array))?;
		let entry = self.schema.lookup().node(field.node);
		debug_assert_eq!(ty, ParamType::Array);
		if entry.is_dynamic {
			// SAFETY: dynamic array nodes store an `ArrayHeader`.
			let header: ArrayHeader = unsafe { read_slot(field.address()) };
			Ok(header.extent as usize)
		} else {
			Ok(entry.fixed_len)
		}
	}

	/// Header state of a dynamic array.
	pub fn array_info(&self, handle: &Handle) -> Result<ArrayInfo> {
		let field = self.resolve_dynamic_array(handle)?;
		// SAFETY: dynamic array nodes store an `ArrayHeader`.
		let header: ArrayHeader = unsafe { read_slot(field.address()) };
		Ok(ArrayInfo {
			extent: header.extent as usize,
			element_size: header.element_size as usize,
			buffer: header.buf,
			owned: header.owned,
		})
	}

	/// Resize a dynamic array, keeping the leading `min(old, new)` elements.
	pub fn set_array_size(&mut self, handle: &Handle, extent: usize) -> Result<()> {
		let field = self.resolve_dynamic_array(handle)?;
		// SAFETY: the header belongs to this instance and its buffers to `self.traits`.
		unsafe { storage::resize_array(self.traits.as_ref(), self.schema.lookup(), field.node, field.address(), extent) }
	}

	/// Current string value; `None` when unset.
	pub fn string(&self, handle: &Handle) -> Result<Option<&str>> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::String))?;
		// SAFETY: string nodes store a `StringSlot` whose bytes live as long as `self`.
		let bytes = unsafe { storage::string_bytes(field.address()) };
		// Only `&str` values are ever stored.
		Ok(bytes.and_then(|bytes| std::str::from_utf8(bytes).ok()))
	}

	/// Replace a string value, or clear it with `None`.
	pub fn set_string(&mut self, handle: &Handle, value: Option<&str>) -> Result<()> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::String))?;
		// SAFETY: the slot belongs to this instance; owned buffers come from `self.traits`.
		unsafe { storage::assign_string(self.traits.as_ref(), field.address(), value) }
	}

	/// Referenced child instance.
	pub fn reference(&self, handle: &Handle) -> Result<Option<&Instance>> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::Ref))?;
		// SAFETY: reference slots hold null or a leaked `Box<Instance>` owned by `self`.
		Ok(unsafe { read_slot::<RefSlot>(field.address()).map(|child| &*child.as_ptr()) })
	}

	/// Referenced child instance, mutably.
	pub fn reference_mut(&mut self, handle: &Handle) -> Result<Option<&mut Instance>> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::Ref))?;
		// SAFETY: as in `reference`; `&mut self` makes the borrow unique.
		Ok(unsafe { read_slot::<RefSlot>(field.address()).map(|child| &mut *child.as_ptr()) })
	}

	/// Check that a reference field would accept `candidate`, without taking it.
	pub fn check_reference(&self, handle: &Handle, candidate: &Instance) -> Result<()> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::Ref))?;
		let node = &self.tree().nodes()[field.node];
		if !node.accepts_variant(candidate.class_name()) {
			return Err(ParamError::InvalidVariant {
				class: candidate.class_name().to_owned(),
				allowed: node.ref_variants.join(", "),
			});
		}
		Ok(())
	}

	/// Store `child` in a reference field, destroying the previous value.
	///
	/// A child whose class the field does not permit is rejected with `InvalidVariant`:
	/// the field keeps its previous value and the rejected child is destroyed. Call
	/// [`Instance::check_reference`] first to keep a candidate that may be rejected.
	pub fn set_reference(&mut self, handle: &Handle, child: Option<Instance>) -> Result<()> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::Ref))?;
		if let Some(candidate) = &child {
			self.check_reference(handle, candidate)?;
		}

		// SAFETY: the slot belongs to this instance and holds null or a leaked box.
		unsafe {
			storage::release_reference(field.address());
			if let Some(child) = child {
				write_slot::<RefSlot>(field.address(), Some(NonNull::from(Box::leak(Box::new(child)))));
			}
		}
		Ok(())
	}

	/// Move the referenced child out of the field, leaving it empty.
	pub fn take_reference(&mut self, handle: &Handle) -> Result<Option<Instance>> {
		let (field, _) = self.resolve_typed(handle, Some(ParamType::Ref))?;
		// SAFETY: the slot belongs to this instance and holds null or a leaked box.
		unsafe {
			let value: RefSlot = read_slot(field.address());
			write_slot::<RefSlot>(field.address(), None);
			Ok(value.map(|child| *Box::from_raw(child.as_ptr())))
		}
	}

	pub(crate) fn base(&self) -> NonNull<u8> {
		match &self.backing {
			Backing::Owned(block) => block.as_ptr(),
			// SAFETY: `create_in_place` checked the region lies inside the block.
			Backing::InPlace { block, offset } => unsafe { block.as_ptr().add(*offset) },
		}
	}

	fn resolve_typed(&self, handle: &Handle, expected: Option<ParamType>) -> Result<(ResolvedField, ParamType)> {
		let field = self.resolve(handle)?;
		let ty = self.schema.lookup().node(field.node).ty;
		if let Some(expected) = expected
			&& expected != ty
		{
			return Err(ParamError::TypeMismatch {
				expected: expected.as_str(),
				got: ty,
			});
		}
		Ok((field, ty))
	}

	fn resolve_dynamic_array(&self, handle: &Handle) -> Result<ResolvedField> {
		let (field, ty) = self.resolve_typed(handle, None)?;
		if !self.schema.lookup().node(field.node).is_dynamic {
			return Err(ParamError::TypeMismatch { expected: "dynamic ARRAY", got: ty });
		}
		Ok(field)
	}

	/// Apply field defaults to inline struct members below `node`.
	fn apply_defaults(&mut self, node: NodeId, handle: &Handle) -> Result<()> {
		let schema = Arc::clone(&self.schema);
		let tree = schema.tree();
		for &child in tree.nodes()[node].children() {
			let child_node = &tree.nodes()[child];
			let child_handle = handle.child(tree, child_node.name)?;
			match (child_node.ty, child_node.default) {
				(ParamType::Struct, _) => self.apply_defaults(child, &child_handle)?,
				(ParamType::String, Some(DefaultDesc::Str(text))) => self.set_string(&child_handle, Some(text))?,
				(ty, Some(default)) => {
					let value = default_scalar(ty, default).ok_or_else(|| ParamError::TypeMismatch {
						expected: ty.as_str(),
						got: ty,
					})?;
					self.set_scalar(&child_handle, value)?;
				}
				_ => {}
			}
		}
		Ok(())
	}
}

fn default_scalar(ty: ParamType, default: DefaultDesc) -> Option<Scalar> {
	match default {
		DefaultDesc::Bool(value) if ty == ParamType::Bool => Some(Scalar::Bool(value)),
		DefaultDesc::Int(value) => Scalar::from_int(ty, i128::from(value)),
		DefaultDesc::UInt(value) => Scalar::from_int(ty, i128::from(value)),
		DefaultDesc::Float(value) => Scalar::from_float(ty, value),
		_ => None,
	}
}

impl Drop for Instance {
	fn drop(&mut self) {
		// SAFETY: the inline region is live until the backing is dropped after this body.
		unsafe { storage::release_contents(self.traits.as_ref(), self.schema.lookup(), 0, self.base()) };
		log::debug!("destroyed {} instance", self.class.name());
	}
}

impl std::fmt::Debug for Instance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Instance")
			.field("class", &self.class.name())
			.field("backing", &self.backing)
			.field("ref_count", &self.ref_count())
			.finish()
	}
}

#[cfg(test)]
mod tests;
