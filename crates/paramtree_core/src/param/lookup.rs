use std::ops::Range;

use crate::param::storage::{ArrayHeader, RefSlot, StringSlot};
use crate::param::{ArraySize, DefinitionTree, NodeId, ParamType};

/// Flattened, offset-bearing counterpart of one definition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupNode {
	/// Type tag, identical to the definition node.
	pub ty: ParamType,
	/// Whether the node is an array with runtime extent.
	pub is_dynamic: bool,
	/// Offset inside the immediate containing struct; element stride for array elements.
	pub offset: usize,
	/// Bytes this node occupies inline (the header for dynamic arrays).
	pub size: usize,
	/// Alignment of the inline storage.
	pub align: usize,
	/// Element count of fixed arrays, zero otherwise.
	pub fixed_len: usize,
	/// Whether strings, references, or dynamic arrays live at or below this node.
	pub has_containers: bool,
	/// Start index into the shared children table.
	pub children_start: usize,
	/// Number of children.
	pub child_count: usize,
}

impl LookupNode {
	/// Range of this node's entries in the shared children table.
	pub fn children_range(&self) -> Range<usize> {
		self.children_start..self.children_start + self.child_count
	}
}

/// Lookup table derived once from a definition tree.
#[derive(Debug, Clone)]
pub struct LookupTable {
	nodes: Vec<LookupNode>,
	children: Vec<NodeId>,
}

impl LookupTable {
	/// Derive offsets and children ranges using C layout rules.
	pub fn derive(tree: &DefinitionTree) -> Self {
		let mut children = Vec::new();
		let mut nodes = Vec::with_capacity(tree.len());
		for node in tree.nodes() {
			let children_start = children.len();
			children.extend_from_slice(node.children());
			nodes.push(LookupNode {
				ty: node.ty,
				is_dynamic: node.is_dynamic_array(),
				offset: 0,
				size: 0,
				align: 1,
				fixed_len: match node.array_size {
					Some(ArraySize::Fixed(count)) => count,
					_ => 0,
				},
				has_containers: false,
				children_start,
				child_count: node.child_count(),
			});
		}

		let mut table = Self { nodes, children };
		table.layout_node(0);
		table
	}

	/// Entry for node `id`.
	pub fn node(&self, id: NodeId) -> &LookupNode {
		&self.nodes[id]
	}

	/// All entries, indexed like the definition tree.
	pub fn nodes(&self) -> &[LookupNode] {
		&self.nodes
	}

	/// Children of `id` in canonical order.
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.children[self.nodes[id].children_range()]
	}

	/// Shared children table.
	pub fn children_table(&self) -> &[NodeId] {
		&self.children
	}

	/// Element node of array `id`.
	pub fn element(&self, id: NodeId) -> Option<NodeId> {
		if self.nodes[id].ty != ParamType::Array {
			return None;
		}
		self.children(id).first().copied()
	}

	/// Byte size of the class inline region.
	pub fn inline_size(&self) -> usize {
		self.nodes[0].size
	}

	/// Alignment of the class inline region.
	pub fn inline_align(&self) -> usize {
		self.nodes[0].align
	}

	/// Whether every entry describes the same field as the tree node of the same index.
	pub fn matches(&self, tree: &DefinitionTree) -> bool {
		self.nodes.len() == tree.len()
			&& self.nodes.iter().zip(tree.nodes()).enumerate().all(|(id, (entry, node))| {
				entry.ty == node.ty
					&& entry.is_dynamic == node.is_dynamic_array()
					&& entry.child_count == node.child_count()
					&& self.children(id) == node.children()
			})
	}

	/// Compute `(size, align)` for `id`, filling child offsets on the way.
	fn layout_node(&mut self, id: NodeId) -> (usize, usize) {
		let ty = self.nodes[id].ty;
		let (size, align, has_containers) = match ty {
			ParamType::Struct => {
				let mut offset = 0_usize;
				let mut align = 1_usize;
				let mut has_containers = false;
				for idx in self.nodes[id].children_range() {
					let child = self.children[idx];
					let (child_size, child_align) = self.layout_node(child);
					offset = align_up(offset, child_align);
					self.nodes[child].offset = offset;
					offset += child_size;
					align = align.max(child_align);
					has_containers |= self.nodes[child].has_containers;
				}
				(align_up(offset, align), align, has_containers)
			}
			ParamType::Array => {
				let element = self.children[self.nodes[id].children_start];
				let (element_size, element_align) = self.layout_node(element);
				let stride = align_up(element_size, element_align);
				self.nodes[element].offset = stride;
				let element_containers = self.nodes[element].has_containers;
				if self.nodes[id].is_dynamic {
					(std::mem::size_of::<ArrayHeader>(), std::mem::align_of::<ArrayHeader>(), true)
				} else {
					(stride * self.nodes[id].fixed_len, element_align, element_containers)
				}
			}
			ParamType::String => (std::mem::size_of::<StringSlot>(), std::mem::align_of::<StringSlot>(), true),
			ParamType::Ref => (std::mem::size_of::<RefSlot>(), std::mem::align_of::<RefSlot>(), true),
			scalar => {
				let (size, align) = scalar.scalar_layout().unwrap_or((0, 1));
				(size, align, false)
			}
		};

		let entry = &mut self.nodes[id];
		entry.size = size;
		entry.align = align;
		entry.has_containers = has_containers;
		(size, align)
	}
}

/// Round `value` up to a multiple of `align` (a power of two).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
	let align = align.max(1);
	(value + align - 1) & !(align - 1)
}
