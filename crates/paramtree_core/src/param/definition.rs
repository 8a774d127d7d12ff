use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::param::desc::{DefaultDesc, FieldDesc, HintDesc, HintValue, TypeDesc};
use crate::param::{ArraySize, ParamType, Traits};

/// Index of a node inside its definition tree.
pub type NodeId = usize;

/// One schema tree node.
#[derive(Debug, Clone)]
pub struct DefinitionNode {
	/// Type tag.
	pub ty: ParamType,
	/// Field name at this depth; array elements repeat the array name.
	pub name: &'static str,
	/// Dotted name from the root, with `[]` for array elements.
	pub long_name: Box<str>,
	/// Whether the field participates in default output.
	pub included: bool,
	/// Element count policy for array nodes.
	pub array_size: Option<ArraySize>,
	/// Metadata hints; informational only.
	pub hints: &'static [HintDesc],
	/// Permitted classes for reference nodes (and arrays of references).
	pub ref_variants: &'static [&'static str],
	/// Dynamic dimensions this array's extent sits under, outermost first: `[0]` for a
	/// top-level dynamic array, `[0, 1]` for the rows of `grid[][]`. Informational;
	/// resolution reads each dimension's own 1-D header.
	pub dynamic_handle_indices: Box<[u8]>,
	/// Default applied on fresh creation.
	pub default: Option<DefaultDesc>,
	/// Parent node, `None` for the root.
	pub parent: Option<NodeId>,
	children: Box<[NodeId]>,
}

impl Default for DefinitionNode {
	fn default() -> Self {
		Self {
			ty: ParamType::Struct,
			name: "",
			long_name: "".into(),
			included: true,
			array_size: None,
			hints: &[],
			ref_variants: &[],
			dynamic_handle_indices: Box::new([]),
			default: None,
			parent: None,
			children: Box::new([]),
		}
	}
}

impl DefinitionNode {
	/// Ordered child node ids.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Number of children.
	pub fn child_count(&self) -> usize {
		self.children.len()
	}

	/// Whether this node is an array with runtime extent.
	pub fn is_dynamic_array(&self) -> bool {
		self.array_size == Some(ArraySize::Dynamic)
	}

	/// Look up a hint by key.
	pub fn hint(&self, name: &str) -> Option<HintValue> {
		self.hints.iter().find(|hint| hint.name == name).map(|hint| hint.value)
	}

	/// Whether a reference of class `class_name` may be stored here.
	pub fn accepts_variant(&self, class_name: &str) -> bool {
		self.ref_variants.is_empty() || self.ref_variants.contains(&class_name)
	}
}

/// Contiguous node storage allocated through the class traits.
struct NodeArena {
	ptr: NonNull<DefinitionNode>,
	len: usize,
	layout: Layout,
	traits: Arc<dyn Traits>,
}

// SAFETY: nodes are only mutated during build, before the arena is shared.
unsafe impl Send for NodeArena {}
// SAFETY: see above.
unsafe impl Sync for NodeArena {}

impl NodeArena {
	fn new(traits: &Arc<dyn Traits>, len: usize) -> Self {
		let layout = match Layout::array::<DefinitionNode>(len.max(1)) {
			Ok(layout) => layout,
			Err(_) => std::alloc::handle_alloc_error(Layout::new::<DefinitionNode>()),
		};
		let Some(raw) = traits.alloc(layout) else {
			std::alloc::handle_alloc_error(layout);
		};
		let ptr = raw.cast::<DefinitionNode>();
		for idx in 0..len {
			// SAFETY: `idx < len` slots were allocated for `DefinitionNode`.
			unsafe { ptr.as_ptr().add(idx).write(DefinitionNode::default()) };
		}

		Self {
			ptr,
			len,
			layout,
			traits: Arc::clone(traits),
		}
	}

	fn as_slice(&self) -> &[DefinitionNode] {
		// SAFETY: all `len` slots are initialized in `new`.
		unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
	}

	fn as_mut_slice(&mut self) -> &mut [DefinitionNode] {
		// SAFETY: all `len` slots are initialized in `new`; `&mut self` is unique.
		unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
	}
}

impl Drop for NodeArena {
	fn drop(&mut self) {
		// SAFETY: slots are initialized and dropped exactly once, then the block is released
		// through the traits that allocated it.
		unsafe {
			std::ptr::drop_in_place(std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
			self.traits.free(self.ptr.cast(), self.layout);
		}
	}
}

/// Class-wide immutable schema tree.
pub struct DefinitionTree {
	class_name: &'static str,
	arena: NodeArena,
}

impl DefinitionTree {
	/// Build the tree for `fields`, allocating node storage through `traits`.
	pub fn build(class_name: &'static str, fields: &'static [FieldDesc], traits: &Arc<dyn Traits>) -> Self {
		let root_ty = TypeDesc::Struct { fields };
		let count = 1 + count_type_nodes(&root_ty);
		let mut arena = NodeArena::new(traits, count);

		let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); count];
		{
			let nodes = arena.as_mut_slice();
			let mut builder = Builder {
				nodes,
				children: &mut children,
				next: 1,
			};
			builder.init_node(0, "", "".into(), &root_ty, true, &[], None, None);
			builder.init_struct_fields(0, "", fields);
			debug_assert_eq!(builder.next, count);
		}

		// Children are attached bottom-up so every child is complete before its parent.
		let nodes = arena.as_mut_slice();
		for id in (0..count).rev() {
			let list = std::mem::take(&mut children[id]);
			nodes[id].children = list.into_boxed_slice();
		}

		log::debug!("built definition tree for {class_name}: {count} nodes");
		Self { class_name, arena }
	}

	/// Class this tree describes.
	pub fn class_name(&self) -> &'static str {
		self.class_name
	}

	/// All nodes in pre-order; index 0 is the root struct.
	pub fn nodes(&self) -> &[DefinitionNode] {
		self.arena.as_slice()
	}

	/// Node count.
	pub fn len(&self) -> usize {
		self.arena.len
	}

	/// Whether the tree has no nodes (never true for a built tree).
	pub fn is_empty(&self) -> bool {
		self.arena.len == 0
	}

	/// Root struct node.
	pub fn root(&self) -> &DefinitionNode {
		&self.nodes()[0]
	}

	/// Node by id.
	pub fn node(&self, id: NodeId) -> Option<&DefinitionNode> {
		self.nodes().get(id)
	}

	/// Find a child of `parent` by field name, returning `(ordinal, id)`.
	pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<(usize, NodeId)> {
		let node = self.node(parent)?;
		node.children()
			.iter()
			.enumerate()
			.find(|(_, child)| self.nodes()[**child].name == name)
			.map(|(ordinal, child)| (ordinal, *child))
	}

	/// Find a node by long name such as `submeshes[]` or `data[].x`.
	pub fn find(&self, long_name: &str) -> Option<NodeId> {
		self.nodes().iter().position(|node| node.long_name.as_ref() == long_name)
	}

	/// Element node of an array node.
	pub fn element_of(&self, array: NodeId) -> Option<NodeId> {
		let node = self.node(array)?;
		if node.ty != ParamType::Array {
			return None;
		}
		node.children().first().copied()
	}
}

impl std::fmt::Debug for DefinitionTree {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DefinitionTree").field("class_name", &self.class_name).field("nodes", &self.nodes()).finish()
	}
}

struct Builder<'a> {
	nodes: &'a mut [DefinitionNode],
	children: &'a mut [Vec<NodeId>],
	next: NodeId,
}

impl Builder<'_> {
	#[allow(clippy::too_many_arguments)]
	fn init_node(
		&mut self,
		id: NodeId,
		name: &'static str,
		long_name: Box<str>,
		ty: &TypeDesc,
		included: bool,
		hints: &'static [HintDesc],
		default: Option<DefaultDesc>,
		parent: Option<NodeId>,
	) {
		let enclosing = self.enclosing_dynamic_arrays(parent);
		let node = &mut self.nodes[id];
		node.ty = ty.param_type();
		node.name = name;
		node.long_name = long_name;
		node.included = included;
		node.hints = hints;
		node.default = default;
		node.parent = parent;
		match ty {
			TypeDesc::Array { size, element } => {
				node.array_size = Some(*size);
				if *size == ArraySize::Dynamic {
					node.dynamic_handle_indices = (0..=enclosing).collect();
				}
				node.ref_variants = ref_variants_of(element);
			}
			TypeDesc::Ref { variants } => node.ref_variants = *variants,
			_ => {}
		}
	}

	/// Dynamic arrays above `parent`, inclusive; parents are initialized before children.
	fn enclosing_dynamic_arrays(&self, mut parent: Option<NodeId>) -> u8 {
		let mut count = 0_u8;
		while let Some(id) = parent {
			if self.nodes[id].is_dynamic_array() {
				count = count.saturating_add(1);
			}
			parent = self.nodes[id].parent;
		}
		count
	}

	fn alloc_id(&mut self, parent: NodeId) -> NodeId {
		let id = self.next;
		self.next += 1;
		self.children[parent].push(id);
		id
	}

	fn init_struct_fields(&mut self, parent: NodeId, prefix: &str, fields: &'static [FieldDesc]) {
		for field in fields {
			let long_name = if prefix.is_empty() {
				field.name.to_owned()
			} else {
				format!("{prefix}.{}", field.name)
			};
			let id = self.alloc_id(parent);
			self.init_node(
				id,
				field.name,
				long_name.clone().into_boxed_str(),
				&field.ty,
				field.included,
				field.hints,
				field.default,
				Some(parent),
			);
			self.init_nested(id, &long_name, field, &field.ty);
		}
	}

	fn init_nested(&mut self, id: NodeId, long_name: &str, field: &FieldDesc, ty: &TypeDesc) {
		match ty {
			TypeDesc::Struct { fields } => self.init_struct_fields(id, long_name, *fields),
			TypeDesc::Array { element, .. } => {
				let element_name = format!("{long_name}[]");
				let element_id = self.alloc_id(id);
				self.init_node(
					element_id,
					field.name,
					element_name.clone().into_boxed_str(),
					element,
					field.included,
					field.hints,
					None,
					Some(id),
				);
				self.init_nested(element_id, &element_name, field, element);
			}
			TypeDesc::Scalar(_) | TypeDesc::String | TypeDesc::Ref { .. } => {}
		}
	}
}

fn ref_variants_of(ty: &TypeDesc) -> &'static [&'static str] {
	match ty {
		TypeDesc::Ref { variants } => *variants,
		TypeDesc::Array { element, .. } => ref_variants_of(element),
		_ => &[],
	}
}

fn count_type_nodes(ty: &TypeDesc) -> usize {
	match ty {
		TypeDesc::Struct { fields } => fields.iter().map(|field| 1 + count_type_nodes(&field.ty)).sum(),
		TypeDesc::Array { element, .. } => 1 + count_type_nodes(element),
		TypeDesc::Scalar(_) | TypeDesc::String | TypeDesc::Ref { .. } => 0,
	}
}

#[cfg(test)]
mod tests;
