use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::param::desc::{ClassInfo, FieldDesc, checksum_hex};
use crate::param::instance::Backing;
use crate::param::{Block, DefinitionTree, Instance, LookupTable, ParamError, Result, Traits};

/// Definition tree and its derived lookup table, shared by every instance of a class.
#[derive(Debug)]
pub struct ClassSchema {
	tree: DefinitionTree,
	lookup: LookupTable,
}

impl ClassSchema {
	fn build(info: &ClassInfo, traits: &Arc<dyn Traits>) -> Self {
		let tree = DefinitionTree::build(info.name, info.fields, traits);
		let lookup = LookupTable::derive(&tree);
		debug_assert!(lookup.matches(&tree));
		Self { tree, lookup }
	}

	/// Class-wide definition tree.
	pub fn tree(&self) -> &DefinitionTree {
		&self.tree
	}

	/// Flattened lookup table, indexed like the tree.
	pub fn lookup(&self) -> &LookupTable {
		&self.lookup
	}

	/// Byte size of the inline region.
	pub fn inline_size(&self) -> usize {
		self.lookup.inline_size()
	}
}

/// Per-class static: identity, layout triple, and the lazily built schema.
///
/// The schema is built at most once per build/free cycle, guarded by double-checked
/// locking on `built`. Instances keep their own `Arc` to the schema they were created
/// against, so freeing the tree never invalidates live instances.
pub struct ClassDescriptor {
	info: ClassInfo,
	built: AtomicBool,
	lock: Mutex<()>,
	schema: RwLock<Option<Arc<ClassSchema>>>,
	builds: AtomicUsize,
}

impl ClassDescriptor {
	/// Wrap a static class description.
	pub const fn new(info: ClassInfo) -> Self {
		Self {
			info,
			built: AtomicBool::new(false),
			lock: Mutex::new(()),
			schema: RwLock::new(None),
			builds: AtomicUsize::new(0),
		}
	}

	/// Class name.
	pub fn name(&self) -> &'static str {
		self.info.name
	}

	/// Layout version, `major << 16 | minor`.
	pub fn version(&self) -> u32 {
		self.info.version
	}

	/// 128-bit layout checksum.
	pub fn checksum(&self) -> [u32; 4] {
		self.info.checksum
	}

	/// Checksum rendered as hex, the form carried by images.
	pub fn checksum_hex(&self) -> String {
		checksum_hex(&self.info.checksum)
	}

	/// Minimum alignment of instance memory.
	pub fn alignment(&self) -> usize {
		self.info.alignment
	}

	/// Root field descriptions.
	pub fn fields(&self) -> &'static [FieldDesc] {
		self.info.fields
	}

	/// Return the class schema, building it through `traits` on first use.
	pub fn definition_tree(&self, traits: &Arc<dyn Traits>) -> Arc<ClassSchema> {
		if self.built.load(Ordering::Acquire)
			&& let Some(schema) = self.published()
		{
			return schema;
		}

		let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		if self.built.load(Ordering::Acquire)
			&& let Some(schema) = self.published()
		{
			return schema;
		}

		let schema = Arc::new(ClassSchema::build(&self.info, traits));
		*self.schema.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&schema));
		self.builds.fetch_add(1, Ordering::Relaxed);
		self.built.store(true, Ordering::Release);
		schema
	}

	/// Currently published schema, if built.
	pub fn schema(&self) -> Option<Arc<ClassSchema>> {
		if !self.built.load(Ordering::Acquire) {
			return None;
		}
		self.published()
	}

	/// Release the class-wide schema; a no-op when nothing is built.
	pub fn free_definition_tree(&self) {
		if !self.built.load(Ordering::Acquire) {
			return;
		}

		let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		if !self.built.load(Ordering::Acquire) {
			return;
		}
		let schema = self.schema.write().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
		self.built.store(false, Ordering::Release);
		drop(schema);
		log::debug!("released definition tree for {}", self.info.name);
	}

	/// Whether a schema is currently published.
	pub fn is_built(&self) -> bool {
		self.built.load(Ordering::Acquire)
	}

	/// Number of schema builds performed so far.
	pub fn build_count(&self) -> usize {
		self.builds.load(Ordering::Relaxed)
	}

	/// Create a fresh instance with empty containers and field defaults applied.
	pub fn create(&'static self, traits: Arc<dyn Traits>) -> Result<Instance> {
		let schema = self.definition_tree(&traits);
		let align = schema.lookup.inline_align().max(self.info.alignment);
		let block = Block::alloc_zeroed(&traits, schema.inline_size(), align)?;
		Instance::new(self, schema, traits, Backing::Owned(block), true)
	}

	/// Create an instance over bytes already laid out at `offset` inside `block`.
	///
	/// Field contents are taken as-is; nothing is initialized. All-zero bytes are a valid
	/// empty instance.
	///
	/// ```compile_fail
	/// use std::sync::Arc;
	/// use paramtree::param::classes::MESH_COOKED_COLLISION_STREAM;
	/// use paramtree::param::{Block, HeapTraits, Traits};
	///
	/// let traits: Arc<dyn Traits> = Arc::new(HeapTraits);
	/// let block = Arc::new(Block::alloc_zeroed(&traits, 64, 8).unwrap());
	/// let _ = MESH_COOKED_COLLISION_STREAM.create_in_place(traits, block, 0);
	/// ```
	///
	/// # Safety
	/// The region at `offset` must hold a value laid out by this class's lookup table:
	/// array headers and string slots are empty, point into `block` with `owned` unset, or
	/// point at memory allocated through `traits` with `owned` set; reference slots are
	/// null or hold a boxed child instance. No other live instance may cover any byte of
	/// the region.
	pub unsafe fn create_in_place(&'static self, traits: Arc<dyn Traits>, block: Arc<Block>, offset: usize) -> Result<Instance> {
		let schema = self.definition_tree(&traits);
		let align = schema.lookup.inline_align().max(self.info.alignment);
		let address = block.as_ptr().as_ptr() as usize + offset;
		if address % align != 0 {
			traits.warn(&format!("Unaligned memory allocation: class={}, align={align}", self.info.name));
			return Err(ParamError::UnalignedBuffer { class: self.info.name, align });
		}
		let end = offset.checked_add(schema.inline_size());
		if end.is_none_or(|end| end > block.size()) {
			return Err(ParamError::AllocationFailure {
				size: end.unwrap_or(usize::MAX),
				align,
			});
		}

		Instance::new(self, schema, traits, Backing::InPlace { block, offset }, false)
	}

	fn published(&self) -> Option<Arc<ClassSchema>> {
		self.schema.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
	}
}

impl std::fmt::Debug for ClassDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClassDescriptor")
			.field("name", &self.info.name)
			.field("version", &self.info.version)
			.field("checksum", &self.checksum_hex())
			.field("built", &self.is_built())
			.finish()
	}
}

#[cfg(test)]
mod tests;
