//! Static schema descriptions supplied per class.
//!
//! Descriptions are plain `'static` data. The definition tree builder consumes them once
//! per class; nothing here is consulted at runtime after the tree exists.

use crate::param::{ArraySize, ParamType};

/// Value of one metadata hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HintValue {
	/// Unsigned integer hint.
	U64(u64),
	/// Floating point hint.
	F64(f64),
	/// Text hint.
	Str(&'static str),
}

/// Metadata key/value attached to a field (documentation, constraints).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HintDesc {
	/// Hint key such as `shortDescription`.
	pub name: &'static str,
	/// Hint payload.
	pub value: HintValue,
}

/// Default applied to an inline field on fresh creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultDesc {
	/// Boolean default.
	Bool(bool),
	/// Signed integer default.
	Int(i64),
	/// Unsigned integer default.
	UInt(u64),
	/// Floating point default.
	Float(f64),
	/// String default.
	Str(&'static str),
}

/// Shape of one described field.
#[derive(Debug, Clone, Copy)]
pub enum TypeDesc {
	/// Plain-data value of the given tag.
	Scalar(ParamType),
	/// Owned string.
	String,
	/// Nested struct.
	Struct {
		/// Ordered child fields.
		fields: &'static [FieldDesc],
	},
	/// Fixed or dynamic array.
	Array {
		/// Element count policy.
		size: ArraySize,
		/// Element shape.
		element: &'static TypeDesc,
	},
	/// Owned reference restricted to a class whitelist.
	Ref {
		/// Permitted concrete class names; empty means unrestricted.
		variants: &'static [&'static str],
	},
}

impl TypeDesc {
	/// Schema type tag for this shape.
	pub fn param_type(&self) -> ParamType {
		match self {
			Self::Scalar(ty) => *ty,
			Self::String => ParamType::String,
			Self::Struct { .. } => ParamType::Struct,
			Self::Array { .. } => ParamType::Array,
			Self::Ref { .. } => ParamType::Ref,
		}
	}
}

/// One described field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDesc {
	/// Field name at its tree depth.
	pub name: &'static str,
	/// Field shape.
	pub ty: TypeDesc,
	/// Documentation and constraint hints.
	pub hints: &'static [HintDesc],
	/// Whether the field participates in default output.
	pub included: bool,
	/// Optional default for inline scalars and strings.
	pub default: Option<DefaultDesc>,
}

impl FieldDesc {
	/// Base value for struct-update syntax in class descriptions.
	pub const BASE: FieldDesc = FieldDesc {
		name: "",
		ty: TypeDesc::Scalar(ParamType::U8),
		hints: &[],
		included: true,
		default: None,
	};
}

/// Class-level description: identity, layout triple, and root fields.
#[derive(Debug, Clone, Copy)]
pub struct ClassInfo {
	/// Class name used by registries and reference whitelists.
	pub name: &'static str,
	/// Layout version, `major << 16 | minor`.
	pub version: u32,
	/// Layout checksum emitted alongside the description.
	pub checksum: [u32; 4],
	/// Minimum alignment of the inline region.
	pub alignment: usize,
	/// Root struct fields in canonical order.
	pub fields: &'static [FieldDesc],
}

/// Pack a `major.minor` version into the class version encoding.
pub const fn class_version(major: u16, minor: u16) -> u32 {
	((major as u32) << 16) | minor as u32
}

/// Render a class checksum as 32 lowercase hex digits.
pub fn checksum_hex(checksum: &[u32; 4]) -> String {
	checksum.iter().map(|word| format!("{word:08x}")).collect()
}
