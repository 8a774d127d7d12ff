use std::fmt::Write as _;
use std::ptr::NonNull;

use crate::param::storage::{ArrayHeader, read_slot};
use crate::param::{ArraySize, ClassSchema, DefinitionTree, FieldPath, NodeId, ParamError, ParamType, PathStep, Result};

/// One step of a handle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleStep {
	/// Descend into the struct child with this ordinal.
	Child(usize),
	/// Select this element of the current array.
	Index(usize),
}

/// Resolvable path to one field of an instance.
///
/// A handle only records steps and the schema node they reach; whether an index is in
/// range is decided per instance at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
	steps: Vec<HandleStep>,
	node: NodeId,
}

impl Handle {
	/// Handle of the root struct.
	pub fn root() -> Self {
		Self { steps: Vec::new(), node: 0 }
	}

	/// Parse a dotted name against `tree`.
	///
	/// Unknown field names and indices past a fixed array length fail with
	/// `IndexOutOfRange`; dynamic indices are only checked on resolution.
	pub fn parse(tree: &DefinitionTree, name: &str) -> Result<Self> {
		let path = FieldPath::parse(name)?;
		let mut handle = Self::root();
		for (step, part) in path.steps.iter().enumerate() {
			let out_of_range = || ParamError::IndexOutOfRange { path: name.to_owned(), step };
			handle = match part {
				PathStep::Field(field) => handle.child(tree, field).map_err(|_| out_of_range())?,
				PathStep::Index(index) => handle.index(tree, *index).map_err(|_| out_of_range())?,
			};
		}
		Ok(handle)
	}

	/// Schema node this handle reaches.
	pub fn node(&self) -> NodeId {
		self.node
	}

	/// Steps from the root.
	pub fn steps(&self) -> &[HandleStep] {
		&self.steps
	}

	/// Whether this is the root handle.
	pub fn is_root(&self) -> bool {
		self.steps.is_empty()
	}

	/// Handle of the named field below this struct.
	pub fn child(&self, tree: &DefinitionTree, name: &str) -> Result<Self> {
		let node = tree.node(self.node).ok_or_else(|| self.out_of_range(tree))?;
		if node.ty != ParamType::Struct {
			return Err(ParamError::TypeMismatch {
				expected: ParamType::Struct.as_str(),
				got: node.ty,
			});
		}
		let (ordinal, child) = tree.child_by_name(self.node, name).ok_or_else(|| self.out_of_range(tree))?;
		Ok(self.push(HandleStep::Child(ordinal), child))
	}

	/// Handle of element `index` of this array.
	pub fn index(&self, tree: &DefinitionTree, index: usize) -> Result<Self> {
		let node = tree.node(self.node).ok_or_else(|| self.out_of_range(tree))?;
		if node.ty != ParamType::Array {
			return Err(ParamError::TypeMismatch {
				expected: ParamType::Array.as_str(),
				got: node.ty,
			});
		}
		if let Some(ArraySize::Fixed(len)) = node.array_size
			&& index >= len
		{
			return Err(self.out_of_range(tree));
		}
		let element = tree.element_of(self.node).ok_or_else(|| self.out_of_range(tree))?;
		Ok(self.push(HandleStep::Index(index), element))
	}

	/// Handle one step up, `None` at the root.
	pub fn parent(&self, tree: &DefinitionTree) -> Option<Self> {
		let mut steps = self.steps.clone();
		steps.pop()?;
		let node = tree.node(self.node)?.parent?;
		Some(Self { steps, node })
	}

	/// Render as a dotted name, e.g. `submeshes[0].name`.
	pub fn to_name(&self, tree: &DefinitionTree) -> String {
		let mut out = String::new();
		let mut node = 0;
		for step in &self.steps {
			match *step {
				HandleStep::Child(ordinal) => {
					let Some(child) = tree.node(node).and_then(|parent| parent.children().get(ordinal).copied()) else {
						break;
					};
					if !out.is_empty() {
						out.push('.');
					}
					out.push_str(tree.nodes()[child].name);
					node = child;
				}
				HandleStep::Index(index) => {
					let _ = write!(out, "[{index}]");
					match tree.element_of(node) {
						Some(element) => node = element,
						None => break,
					}
				}
			}
		}
		out
	}

	fn push(&self, step: HandleStep, node: NodeId) -> Self {
		let mut steps = Vec::with_capacity(self.steps.len() + 1);
		steps.extend_from_slice(&self.steps);
		steps.push(step);
		Self { steps, node }
	}

	fn out_of_range(&self, tree: &DefinitionTree) -> ParamError {
		ParamError::IndexOutOfRange {
			path: self.to_name(tree),
			step: self.steps.len(),
		}
	}
}

/// Address of a field reached by resolving a handle against one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
	/// Schema node of the field.
	pub node: NodeId,
	/// Start of the immediate container (struct region or array element buffer).
	pub container: NonNull<u8>,
	/// Byte offset of the field inside its container.
	pub offset: usize,
}

impl ResolvedField {
	/// Address of the field's storage.
	pub fn address(&self) -> NonNull<u8> {
		// SAFETY: `offset` was computed inside the container's layout during resolution.
		unsafe { self.container.add(self.offset) }
	}
}

/// Walk `handle` through the lookup table starting at the inline region `base`.
///
/// Fails with `IndexOutOfRange` when a step leaves the tree, an index is past the current
/// extent, or the walk ends on a node other than the one the handle was built for.
///
/// # Safety
/// `base` must address a live inline region laid out by `schema`.
pub(crate) unsafe fn resolve(schema: &ClassSchema, base: NonNull<u8>, handle: &Handle) -> Result<ResolvedField> {
	let lookup = schema.lookup();
	let mut node = 0;
	let mut container = base;
	let mut offset = 0;

	for (step, part) in handle.steps.iter().enumerate() {
		let fail = || ParamError::IndexOutOfRange {
			path: handle.to_name(schema.tree()),
			step,
		};
		// SAFETY: every offset below stays within layouts computed by the lookup table.
		let here = unsafe { container.add(offset) };
		let entry = lookup.node(node);
		match *part {
			HandleStep::Child(ordinal) => {
				if entry.ty != ParamType::Struct {
					return Err(fail());
				}
				let child = *lookup.children(node).get(ordinal).ok_or_else(fail)?;
				container = here;
				offset = lookup.node(child).offset;
				node = child;
			}
			HandleStep::Index(index) => {
				if entry.ty != ParamType::Array {
					return Err(fail());
				}
				let element = lookup.element(node).ok_or_else(fail)?;
				let stride = lookup.node(element).offset;
				if entry.is_dynamic {
					// SAFETY: dynamic array nodes store an `ArrayHeader`.
					let header: ArrayHeader = unsafe { read_slot(here) };
					if index >= header.extent as usize {
						return Err(fail());
					}
					container = header.buf.ok_or_else(fail)?;
				} else {
					if index >= entry.fixed_len {
						return Err(fail());
					}
					container = here;
				}
				offset = index * stride;
				node = element;
			}
		}
	}

	// Handles built against another class can walk this tree yet land elsewhere.
	if node != handle.node {
		return Err(ParamError::IndexOutOfRange {
			path: handle.to_name(schema.tree()),
			step: handle.steps.len(),
		});
	}

	Ok(ResolvedField { node, container, offset })
}
