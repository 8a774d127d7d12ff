use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::param::{ParamError, Result, Traits};

/// Zero-initialized, aligned memory block owned through a [`Traits`] allocator.
///
/// The block is released through the same traits value when dropped.
pub struct Block {
	ptr: NonNull<u8>,
	layout: Layout,
	traits: Arc<dyn Traits>,
}

// SAFETY: the block is plain bytes; access discipline is enforced by the owning instance(s).
unsafe impl Send for Block {}
// SAFETY: see above; instances sharing a block only touch disjoint regions.
unsafe impl Sync for Block {}

impl Block {
	/// Allocate `size` zeroed bytes aligned to `align`.
	pub fn alloc_zeroed(traits: &Arc<dyn Traits>, size: usize, align: usize) -> Result<Self> {
		let (ptr, layout) = alloc_zeroed(traits.as_ref(), size.max(1), align)?;
		Ok(Self {
			ptr,
			layout,
			traits: Arc::clone(traits),
		})
	}

	/// Base address of the block.
	pub fn as_ptr(&self) -> NonNull<u8> {
		self.ptr
	}

	/// Usable byte size.
	pub fn size(&self) -> usize {
		self.layout.size()
	}

	/// Alignment the block was allocated with.
	pub fn align(&self) -> usize {
		self.layout.align()
	}

	/// Traits the block was allocated through.
	pub fn traits(&self) -> &Arc<dyn Traits> {
		&self.traits
	}

	/// Copy `bytes` into the block starting at `offset`.
	pub fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
		if offset.checked_add(bytes.len()).is_none_or(|end| end > self.size()) {
			return Err(ParamError::AllocationFailure {
				size: offset.saturating_add(bytes.len()),
				align: self.align(),
			});
		}
		// SAFETY: range checked against the allocation above.
		unsafe { self.ptr.as_ptr().add(offset).copy_from_nonoverlapping(bytes.as_ptr(), bytes.len()) };
		Ok(())
	}
}

/// Allocate `size` (non-zero) zeroed bytes through `traits`, rejecting misaligned results.
pub(crate) fn alloc_zeroed(traits: &dyn Traits, size: usize, align: usize) -> Result<(NonNull<u8>, Layout)> {
	let layout = Layout::from_size_align(size, align.max(1)).map_err(|_| ParamError::AllocationFailure { size, align })?;
	let ptr = traits.alloc(layout).ok_or(ParamError::AllocationFailure { size, align })?;
	if ptr.as_ptr().align_offset(layout.align()) != 0 {
		traits.warn(&format!("unaligned memory allocation: size={size}, align={align}"));
		// SAFETY: just allocated with `layout`.
		unsafe { traits.free(ptr, layout) };
		return Err(ParamError::AllocationFailure { size, align });
	}

	// SAFETY: `ptr` is valid for `layout.size()` bytes.
	unsafe { ptr.as_ptr().write_bytes(0, layout.size()) };
	Ok((ptr, layout))
}

impl Drop for Block {
	fn drop(&mut self) {
		// SAFETY: allocated by `self.traits` with `self.layout`, released exactly once here.
		unsafe { self.traits.free(self.ptr, self.layout) };
	}
}

impl std::fmt::Debug for Block {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Block").field("ptr", &self.ptr).field("len", &self.size()).field("align", &self.align()).finish()
	}
}
