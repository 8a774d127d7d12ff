//! Raw container slots stored inside instance memory and the operations that own them.
//!
//! Dynamic array headers, string slots, and reference slots are written into the
//! inline region (or into array buffers) at the offsets computed by the lookup table.
//! All-zero bytes are a valid empty value for every slot type.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::param::block::alloc_zeroed;
use crate::param::{Instance, LookupTable, NodeId, ParamError, ParamType, Result, Traits};

/// Header of a dynamic array: buffer is `Some` iff `extent > 0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrayHeader {
	pub buf: Option<NonNull<u8>>,
	pub extent: u32,
	pub element_size: u32,
	pub owned: bool,
}

impl ArrayHeader {
	pub(crate) fn empty(element_size: usize, owned: bool) -> Self {
		Self {
			buf: None,
			extent: 0,
			element_size: element_size as u32,
			owned,
		}
	}
}

/// Null-terminated string storage; `len` excludes the terminator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StringSlot {
	pub buf: Option<NonNull<u8>>,
	pub len: u32,
	pub owned: bool,
}

impl StringSlot {
	pub(crate) const EMPTY: Self = Self {
		buf: None,
		len: 0,
		owned: true,
	};
}

/// Exclusively-owned child instance.
pub(crate) type RefSlot = Option<NonNull<Instance>>;

/// Read a `T` stored (possibly unaligned) at `ptr`.
///
/// # Safety
/// `ptr` must be valid for reads of `size_of::<T>()` bytes holding a valid `T`.
pub(crate) unsafe fn read_slot<T: Copy>(ptr: NonNull<u8>) -> T {
	// SAFETY: forwarded caller contract.
	unsafe { ptr.as_ptr().cast::<T>().read_unaligned() }
}

/// Write a `T` (possibly unaligned) at `ptr` without dropping the previous bytes.
///
/// # Safety
/// `ptr` must be valid for writes of `size_of::<T>()` bytes.
pub(crate) unsafe fn write_slot<T>(ptr: NonNull<u8>, value: T) {
	// SAFETY: forwarded caller contract.
	unsafe { ptr.as_ptr().cast::<T>().write_unaligned(value) }
}

/// Visit container slots below `node` stored at `ptr`.
///
/// Strings and references are visited in field order; a dynamic array header is visited
/// after every element of its buffer.
///
/// # Safety
/// `ptr` must address a live value laid out as `node` in `lookup`.
pub(crate) unsafe fn walk_containers(lookup: &LookupTable, node: NodeId, ptr: NonNull<u8>, visit: &mut dyn FnMut(NodeId, NonNull<u8>)) {
	let entry = lookup.node(node);
	if !entry.has_containers {
		return;
	}

	match entry.ty {
		ParamType::Struct => {
			for &child in lookup.children(node) {
				// SAFETY: child offsets lie within the struct layout.
				let child_ptr = unsafe { ptr.add(lookup.node(child).offset) };
				// SAFETY: forwarded caller contract.
				unsafe { walk_containers(lookup, child, child_ptr, visit) };
			}
		}
		ParamType::Array => {
			let Some(element) = lookup.element(node) else {
				return;
			};
			let stride = lookup.node(element).offset;
			if entry.is_dynamic {
				// SAFETY: dynamic array nodes store an `ArrayHeader`.
				let header: ArrayHeader = unsafe { read_slot(ptr) };
				if let Some(buf) = header.buf
					&& lookup.node(element).has_containers
				{
					for idx in 0..header.extent as usize {
						// SAFETY: the buffer holds `extent` elements of `stride` bytes.
						unsafe { walk_containers(lookup, element, buf.add(idx * stride), visit) };
					}
				}
				visit(node, ptr);
			} else {
				for idx in 0..entry.fixed_len {
					// SAFETY: fixed arrays store `fixed_len` elements inline.
					unsafe { walk_containers(lookup, element, ptr.add(idx * stride), visit) };
				}
			}
		}
		ParamType::String | ParamType::Ref => visit(node, ptr),
		_ => {}
	}
}

/// Put freshly zeroed containers below `node` into their default empty state.
///
/// # Safety
/// `ptr` must address zeroed memory laid out as `node` in `lookup`.
pub(crate) unsafe fn init_containers(lookup: &LookupTable, node: NodeId, ptr: NonNull<u8>) {
	// SAFETY: forwarded caller contract.
	unsafe {
		walk_containers(lookup, node, ptr, &mut |id, slot| match lookup.node(id).ty {
			ParamType::Array => {
				let stride = lookup.element(id).map_or(0, |element| lookup.node(element).offset);
				write_slot(slot, ArrayHeader::empty(stride, true));
			}
			ParamType::String => write_slot(slot, StringSlot::EMPTY),
			_ => {}
		});
	}
}

/// Release every container below `node`: strings, then references, then array buffers.
///
/// Array buffers may hold string slots and reference pointers, so their contents are
/// released before any raw buffer is freed.
///
/// # Safety
/// `ptr` must address a live value laid out as `node` in `lookup`, whose owned memory was
/// allocated through `traits`.
pub(crate) unsafe fn release_contents(traits: &dyn Traits, lookup: &LookupTable, node: NodeId, ptr: NonNull<u8>) {
	// SAFETY: forwarded caller contract for all three passes.
	unsafe {
		walk_containers(lookup, node, ptr, &mut |id, slot| {
			if lookup.node(id).ty == ParamType::String {
				release_string(traits, slot);
			}
		});
		walk_containers(lookup, node, ptr, &mut |id, slot| {
			if lookup.node(id).ty == ParamType::Ref {
				release_reference(slot);
			}
		});
		walk_containers(lookup, node, ptr, &mut |id, slot| {
			if lookup.node(id).ty == ParamType::Array {
				release_array(traits, lookup, id, slot);
			}
		});
	}
}

/// Free an owned string buffer and reset the slot.
///
/// # Safety
/// `slot` must hold a `StringSlot` whose owned buffer came from `traits`.
pub(crate) unsafe fn release_string(traits: &dyn Traits, slot: NonNull<u8>) {
	// SAFETY: forwarded caller contract.
	unsafe {
		let value: StringSlot = read_slot(slot);
		if value.owned
			&& let Some(buf) = value.buf
		{
			traits.str_free(buf, value.len as usize);
		}
		write_slot(slot, StringSlot { owned: false, ..StringSlot::EMPTY });
	}
}

/// Destroy an owned child instance and reset the slot.
///
/// # Safety
/// `slot` must hold a `RefSlot` whose pointer came from `Box::into_raw`.
pub(crate) unsafe fn release_reference(slot: NonNull<u8>) {
	// SAFETY: forwarded caller contract.
	unsafe {
		let value: RefSlot = read_slot(slot);
		write_slot::<RefSlot>(slot, None);
		if let Some(child) = value {
			drop(Box::from_raw(child.as_ptr()));
		}
	}
}

/// Free an owned array buffer (not its contents) and reset the header.
///
/// # Safety
/// `slot` must hold the `ArrayHeader` of array node `id`; an owned buffer must come from `traits`.
pub(crate) unsafe fn release_array(traits: &dyn Traits, lookup: &LookupTable, id: NodeId, slot: NonNull<u8>) {
	// SAFETY: forwarded caller contract.
	unsafe {
		let header: ArrayHeader = read_slot(slot);
		if header.owned
			&& let Some(buf) = header.buf
			&& let Some(layout) = array_layout(lookup, id, header.extent as usize)
		{
			traits.free(buf, layout);
		}
		write_slot(slot, ArrayHeader::empty(header.element_size as usize, false));
	}
}

fn array_layout(lookup: &LookupTable, id: NodeId, extent: usize) -> Option<Layout> {
	let element = lookup.node(lookup.element(id)?);
	Layout::from_size_align(element.offset.checked_mul(extent)?.max(1), element.align).ok()
}

/// Resize dynamic array `id` whose header lives at `slot`.
///
/// Surviving elements keep their bytes, new elements are zeroed and default-initialized,
/// and contents of dropped elements are released. An extent of zero leaves a null,
/// non-owned buffer.
///
/// # Safety
/// `slot` must hold the `ArrayHeader` of array node `id`; owned memory must come from `traits`.
pub(crate) unsafe fn resize_array(traits: &dyn Traits, lookup: &LookupTable, id: NodeId, slot: NonNull<u8>, new_extent: usize) -> Result<()> {
	let Some(element) = lookup.element(id) else {
		return Ok(());
	};
	let stride = lookup.node(element).offset;
	let align = lookup.node(element).align;
	// SAFETY: forwarded caller contract.
	let header: ArrayHeader = unsafe { read_slot(slot) };
	let old_extent = header.extent as usize;
	if new_extent == old_extent {
		return Ok(());
	}

	if new_extent == 0 {
		// SAFETY: forwarded caller contract.
		unsafe {
			if let Some(buf) = header.buf {
				for idx in 0..old_extent {
					release_contents(traits, lookup, element, buf.add(idx * stride));
				}
			}
			release_array(traits, lookup, id, slot);
		}
		return Ok(());
	}

	let extent = u32::try_from(new_extent).map_err(|_| ParamError::AllocationFailure { size: new_extent, align })?;
	let size = stride.checked_mul(new_extent).ok_or(ParamError::AllocationFailure { size: usize::MAX, align })?;
	let (new_buf, _) = alloc_zeroed(traits, size.max(1), align)?;

	// SAFETY: old buffer holds `old_extent` elements; new buffer holds `new_extent`.
	unsafe {
		if let Some(old_buf) = header.buf {
			for idx in new_extent..old_extent {
				release_contents(traits, lookup, element, old_buf.add(idx * stride));
			}
			let keep = old_extent.min(new_extent) * stride;
			new_buf.as_ptr().copy_from_nonoverlapping(old_buf.as_ptr(), keep);
			if header.owned
				&& let Some(layout) = array_layout(lookup, id, old_extent)
			{
				traits.free(old_buf, layout);
			}
		}
		for idx in old_extent..new_extent {
			init_containers(lookup, element, new_buf.add(idx * stride));
		}
		write_slot(
			slot,
			ArrayHeader {
				buf: Some(new_buf),
				extent,
				element_size: stride as u32,
				owned: true,
			},
		);
	}
	Ok(())
}

/// Replace the string at `slot`, freeing the previous owned buffer first.
///
/// # Safety
/// `slot` must hold a `StringSlot` whose owned buffer came from `traits`.
pub(crate) unsafe fn assign_string(traits: &dyn Traits, slot: NonNull<u8>, value: Option<&str>) -> Result<()> {
	// SAFETY: forwarded caller contract.
	unsafe { release_string(traits, slot) };
	let Some(text) = value else {
		return Ok(());
	};

	let len = text.len();
	let encoded_len = u32::try_from(len).map_err(|_| ParamError::AllocationFailure { size: len, align: 1 })?;
	let buf = traits.str_alloc(len).ok_or(ParamError::AllocationFailure { size: len + 1, align: 1 })?;
	// SAFETY: `buf` holds `len + 1` bytes.
	unsafe {
		buf.as_ptr().copy_from_nonoverlapping(text.as_ptr(), len);
		buf.as_ptr().add(len).write(0);
		write_slot(
			slot,
			StringSlot {
				buf: Some(buf),
				len: encoded_len,
				owned: true,
			},
		);
	}
	Ok(())
}

/// Borrow the bytes of the string at `slot`, without the terminator.
///
/// # Safety
/// `slot` must hold a `StringSlot` that stays valid for `'a`.
pub(crate) unsafe fn string_bytes<'a>(slot: NonNull<u8>) -> Option<&'a [u8]> {
	// SAFETY: forwarded caller contract.
	unsafe {
		let value: StringSlot = read_slot(slot);
		value.buf.map(|buf| std::slice::from_raw_parts(buf.as_ptr(), value.len as usize))
	}
}

#[cfg(test)]
mod tests;
