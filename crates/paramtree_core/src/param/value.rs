use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::param::{Handle, Image, Instance, NodeId, ParamType, Result, Scalar};

/// Generic field value exported from an instance.
///
/// Float tuples (vectors, quaternions, bounds, matrices) export as arrays of their
/// components in memory order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	/// Unset string or reference.
	Null,
	/// Boolean field.
	Bool(bool),
	/// Unsigned integer field.
	UInt(u64),
	/// Signed integer field.
	Int(i64),
	/// Floating point field.
	Float(f64),
	/// String field.
	String(String),
	/// Array elements, or float tuple components.
	Array(Vec<Value>),
	/// Referenced child instance with its class identity.
	Ref(Box<Image>),
	/// Struct fields by name.
	Struct(BTreeMap<String, Value>),
}

impl Value {
	/// Convert a plain-data value.
	pub fn from_scalar(value: Scalar) -> Self {
		match value {
			Scalar::Bool(v) => Self::Bool(v),
			Scalar::I8(v) => Self::Int(i64::from(v)),
			Scalar::I16(v) => Self::Int(i64::from(v)),
			Scalar::I32(v) => Self::Int(i64::from(v)),
			Scalar::I64(v) => Self::Int(v),
			Scalar::U8(v) => Self::UInt(u64::from(v)),
			Scalar::U16(v) => Self::UInt(u64::from(v)),
			Scalar::U32(v) => Self::UInt(u64::from(v)),
			Scalar::U64(v) => Self::UInt(v),
			Scalar::F32(v) => Self::Float(f64::from(v)),
			Scalar::F64(v) => Self::Float(v),
			tuple => Self::Array(tuple.components().into_iter().map(|c| Self::Float(f64::from(c))).collect()),
		}
	}

	/// Struct field by name.
	pub fn field(&self, name: &str) -> Option<&Value> {
		match self {
			Self::Struct(fields) => fields.get(name),
			_ => None,
		}
	}
}

/// Controls for exporting instances to values.
#[derive(Debug, Clone)]
pub struct ExportOptions {
	/// Export fields not marked as included in output.
	pub include_all: bool,
	/// Maximum reference nesting; deeper references export as `Null`.
	pub max_ref_depth: u32,
}

impl Default for ExportOptions {
	fn default() -> Self {
		Self {
			include_all: false,
			max_ref_depth: 32,
		}
	}
}

impl ExportOptions {
	/// Preset exporting every field, for inspection.
	pub fn everything() -> Self {
		Self {
			include_all: true,
			max_ref_depth: 32,
		}
	}
}

impl Instance {
	/// Export the whole instance as a struct value.
	pub fn export(&self, options: &ExportOptions) -> Result<Value> {
		export_at(self, Handle::root(), options, 0)
	}

	/// Export the field a handle reaches.
	pub fn export_field(&self, handle: &Handle, options: &ExportOptions) -> Result<Value> {
		export_at(self, handle.clone(), options, 0)
	}
}

pub(crate) fn export_at(instance: &Instance, handle: Handle, options: &ExportOptions, depth: u32) -> Result<Value> {
	let tree = instance.tree();
	let node: NodeId = instance.resolve(&handle)?.node;
	let ty = tree.nodes()[node].ty;
	let value = match ty {
		ParamType::Struct => {
			let mut fields = BTreeMap::new();
			for &child in tree.nodes()[node].children() {
				let child_node = &tree.nodes()[child];
				if !child_node.included && !options.include_all {
					continue;
				}
				let child_handle = handle.child(tree, child_node.name)?;
				fields.insert(child_node.name.to_owned(), export_at(instance, child_handle, options, depth)?);
			}
			Value::Struct(fields)
		}
		ParamType::Array => {
			let len = instance.array_size(&handle)?;
			let mut items = Vec::with_capacity(len);
			for index in 0..len {
				items.push(export_at(instance, handle.index(tree, index)?, options, depth)?);
			}
			Value::Array(items)
		}
		ParamType::String => instance.string(&handle)?.map_or(Value::Null, |text| Value::String(text.to_owned())),
		ParamType::Ref => match instance.reference(&handle)? {
			Some(child) if depth < options.max_ref_depth => Value::Ref(Box::new(Image::capture(child, options, depth + 1)?)),
			Some(child) => {
				log::debug!("reference depth limit reached at {} ({})", handle.to_name(tree), child.class_name());
				Value::Null
			}
			None => Value::Null,
		},
		_ => Value::from_scalar(instance.get_scalar(&handle)?),
	};
	Ok(value)
}
