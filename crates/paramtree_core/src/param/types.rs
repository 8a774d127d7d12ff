use std::fmt;

use serde::{Deserialize, Serialize};

/// Type tag of one schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
	/// Nested struct with named children.
	Struct,
	/// Fixed or dynamic array with one synthetic element child.
	Array,
	/// Owned reference to another instance.
	Ref,
	/// Owned null-terminated string.
	String,
	/// `bool`.
	Bool,
	/// `i8`.
	I8,
	/// `i16`.
	I16,
	/// `i32`.
	I32,
	/// `i64`.
	I64,
	/// `u8`.
	U8,
	/// `u16`.
	U16,
	/// `u32`.
	U32,
	/// `u64`.
	U64,
	/// `f32`.
	F32,
	/// `f64`.
	F64,
	/// Two `f32` components.
	Vec2,
	/// Three `f32` components.
	Vec3,
	/// Four `f32` components.
	Vec4,
	/// Quaternion as four `f32` components.
	Quat,
	/// Axis-aligned box as `min`/`max` `Vec3`.
	Bounds3,
	/// Row-major 3x3 `f32` matrix.
	Mat33,
	/// Row-major 4x4 `f32` matrix.
	Mat44,
}

impl ParamType {
	/// Render type tag as a stable label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Struct => "STRUCT",
			Self::Array => "ARRAY",
			Self::Ref => "REF",
			Self::String => "STRING",
			Self::Bool => "BOOL",
			Self::I8 => "I8",
			Self::I16 => "I16",
			Self::I32 => "I32",
			Self::I64 => "I64",
			Self::U8 => "U8",
			Self::U16 => "U16",
			Self::U32 => "U32",
			Self::U64 => "U64",
			Self::F32 => "F32",
			Self::F64 => "F64",
			Self::Vec2 => "VEC2",
			Self::Vec3 => "VEC3",
			Self::Vec4 => "VEC4",
			Self::Quat => "QUAT",
			Self::Bounds3 => "BOUNDS3",
			Self::Mat33 => "MAT33",
			Self::Mat44 => "MAT44",
		}
	}

	/// Byte size and alignment for plain-data tags, `None` for containers.
	pub fn scalar_layout(self) -> Option<(usize, usize)> {
		let layout = match self {
			Self::Bool | Self::I8 | Self::U8 => (1, 1),
			Self::I16 | Self::U16 => (2, 2),
			Self::I32 | Self::U32 | Self::F32 => (4, 4),
			Self::I64 | Self::U64 | Self::F64 => (8, 8),
			Self::Vec2 => (8, 4),
			Self::Vec3 => (12, 4),
			Self::Vec4 | Self::Quat => (16, 4),
			Self::Bounds3 => (24, 4),
			Self::Mat33 => (36, 4),
			Self::Mat44 => (64, 4),
			Self::Struct | Self::Array | Self::Ref | Self::String => return None,
		};
		Some(layout)
	}

	/// Whether this tag stores plain data only.
	pub fn is_scalar(self) -> bool {
		self.scalar_layout().is_some()
	}

	fn float_count(self) -> Option<usize> {
		match self {
			Self::Vec2 => Some(2),
			Self::Vec3 => Some(3),
			Self::Vec4 | Self::Quat => Some(4),
			Self::Bounds3 => Some(6),
			Self::Mat33 => Some(9),
			Self::Mat44 => Some(16),
			_ => None,
		}
	}
}

impl fmt::Display for ParamType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Element count of an array node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
	/// Inline array with a count fixed by the schema.
	Fixed(usize),
	/// Out-of-line array whose extent is set at runtime.
	Dynamic,
}

impl ArraySize {
	/// Signed encoding used by schema dumps, `-1` for dynamic.
	pub fn as_i64(self) -> i64 {
		match self {
			Self::Fixed(count) => count as i64,
			Self::Dynamic => -1,
		}
	}
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds3 {
	/// Minimum corner.
	pub min: [f32; 3],
	/// Maximum corner.
	pub max: [f32; 3],
}

/// Plain-data field value with its type tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
	/// `bool` value.
	Bool(bool),
	/// `i8` value.
	I8(i8),
	/// `i16` value.
	I16(i16),
	/// `i32` value.
	I32(i32),
	/// `i64` value.
	I64(i64),
	/// `u8` value.
	U8(u8),
	/// `u16` value.
	U16(u16),
	/// `u32` value.
	U32(u32),
	/// `u64` value.
	U64(u64),
	/// `f32` value.
	F32(f32),
	/// `f64` value.
	F64(f64),
	/// `Vec2` value.
	Vec2([f32; 2]),
	/// `Vec3` value.
	Vec3([f32; 3]),
	/// `Vec4` value.
	Vec4([f32; 4]),
	/// `Quat` value.
	Quat([f32; 4]),
	/// `Bounds3` value.
	Bounds3(Bounds3),
	/// `Mat33` value.
	Mat33([f32; 9]),
	/// `Mat44` value.
	Mat44([f32; 16]),
}

impl Scalar {
	/// Type tag of this value.
	pub fn ty(&self) -> ParamType {
		match self {
			Self::Bool(_) => ParamType::Bool,
			Self::I8(_) => ParamType::I8,
			Self::I16(_) => ParamType::I16,
			Self::I32(_) => ParamType::I32,
			Self::I64(_) => ParamType::I64,
			Self::U8(_) => ParamType::U8,
			Self::U16(_) => ParamType::U16,
			Self::U32(_) => ParamType::U32,
			Self::U64(_) => ParamType::U64,
			Self::F32(_) => ParamType::F32,
			Self::F64(_) => ParamType::F64,
			Self::Vec2(_) => ParamType::Vec2,
			Self::Vec3(_) => ParamType::Vec3,
			Self::Vec4(_) => ParamType::Vec4,
			Self::Quat(_) => ParamType::Quat,
			Self::Bounds3(_) => ParamType::Bounds3,
			Self::Mat33(_) => ParamType::Mat33,
			Self::Mat44(_) => ParamType::Mat44,
		}
	}

	/// Zero value for a plain-data tag.
	pub fn zero(ty: ParamType) -> Option<Self> {
		let zeros = [0_u8; 64];
		Self::read(ty, &zeros)
	}

	/// Decode a native-endian value of type `ty` from the front of `bytes`.
	pub fn read(ty: ParamType, bytes: &[u8]) -> Option<Self> {
		let (size, _) = ty.scalar_layout()?;
		let bytes = bytes.get(..size)?;
		let value = match ty {
			ParamType::Bool => Self::Bool(bytes[0] != 0),
			ParamType::I8 => Self::I8(i8::from_ne_bytes([bytes[0]])),
			ParamType::U8 => Self::U8(bytes[0]),
			ParamType::I16 => Self::I16(i16::from_ne_bytes(array(bytes))),
			ParamType::U16 => Self::U16(u16::from_ne_bytes(array(bytes))),
			ParamType::I32 => Self::I32(i32::from_ne_bytes(array(bytes))),
			ParamType::U32 => Self::U32(u32::from_ne_bytes(array(bytes))),
			ParamType::F32 => Self::F32(f32::from_ne_bytes(array(bytes))),
			ParamType::I64 => Self::I64(i64::from_ne_bytes(array(bytes))),
			ParamType::U64 => Self::U64(u64::from_ne_bytes(array(bytes))),
			ParamType::F64 => Self::F64(f64::from_ne_bytes(array(bytes))),
			ParamType::Vec2 => Self::Vec2(floats(bytes)),
			ParamType::Vec3 => Self::Vec3(floats(bytes)),
			ParamType::Vec4 => Self::Vec4(floats(bytes)),
			ParamType::Quat => Self::Quat(floats(bytes)),
			ParamType::Bounds3 => {
				let raw: [f32; 6] = floats(bytes);
				Self::Bounds3(Bounds3 {
					min: [raw[0], raw[1], raw[2]],
					max: [raw[3], raw[4], raw[5]],
				})
			}
			ParamType::Mat33 => Self::Mat33(floats(bytes)),
			ParamType::Mat44 => Self::Mat44(floats(bytes)),
			ParamType::Struct | ParamType::Array | ParamType::Ref | ParamType::String => return None,
		};
		Some(value)
	}

	/// Encode this value native-endian into the front of `out`.
	pub fn write(&self, out: &mut [u8]) {
		match *self {
			Self::Bool(v) => out[0] = u8::from(v),
			Self::I8(v) => out[..1].copy_from_slice(&v.to_ne_bytes()),
			Self::U8(v) => out[0] = v,
			Self::I16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
			Self::U16(v) => out[..2].copy_from_slice(&v.to_ne_bytes()),
			Self::I32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
			Self::U32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
			Self::F32(v) => out[..4].copy_from_slice(&v.to_ne_bytes()),
			Self::I64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
			Self::U64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
			Self::F64(v) => out[..8].copy_from_slice(&v.to_ne_bytes()),
			Self::Vec2(v) => write_floats(&v, out),
			Self::Vec3(v) => write_floats(&v, out),
			Self::Vec4(v) | Self::Quat(v) => write_floats(&v, out),
			Self::Bounds3(b) => {
				write_floats(&b.min, out);
				write_floats(&b.max, &mut out[12..]);
			}
			Self::Mat33(v) => write_floats(&v, out),
			Self::Mat44(v) => write_floats(&v, out),
		}
	}

	/// Convert an integer into a numeric value of type `ty`, rejecting values that do not fit.
	pub fn from_int(ty: ParamType, value: i128) -> Option<Self> {
		let scalar = match ty {
			ParamType::I8 => Self::I8(i8::try_from(value).ok()?),
			ParamType::I16 => Self::I16(i16::try_from(value).ok()?),
			ParamType::I32 => Self::I32(i32::try_from(value).ok()?),
			ParamType::I64 => Self::I64(i64::try_from(value).ok()?),
			ParamType::U8 => Self::U8(u8::try_from(value).ok()?),
			ParamType::U16 => Self::U16(u16::try_from(value).ok()?),
			ParamType::U32 => Self::U32(u32::try_from(value).ok()?),
			ParamType::U64 => Self::U64(u64::try_from(value).ok()?),
			ParamType::F32 => Self::F32(value as f32),
			ParamType::F64 => Self::F64(value as f64),
			_ => return None,
		};
		Some(scalar)
	}

	/// Convert a float into a numeric value of type `ty`; integer tags accept whole numbers only.
	pub fn from_float(ty: ParamType, value: f64) -> Option<Self> {
		match ty {
			ParamType::F32 => Some(Self::F32(value as f32)),
			ParamType::F64 => Some(Self::F64(value)),
			_ if value.is_finite() && value.fract() == 0.0 => Self::from_int(ty, value as i128),
			_ => None,
		}
	}

	/// Flatten numeric components, used by value export.
	pub fn components(&self) -> Vec<f32> {
		match *self {
			Self::Vec2(v) => v.to_vec(),
			Self::Vec3(v) => v.to_vec(),
			Self::Vec4(v) | Self::Quat(v) => v.to_vec(),
			Self::Bounds3(b) => b.min.iter().chain(b.max.iter()).copied().collect(),
			Self::Mat33(v) => v.to_vec(),
			Self::Mat44(v) => v.to_vec(),
			_ => Vec::new(),
		}
	}

	/// Build a float-tuple value of type `ty` from flattened components.
	pub fn from_components(ty: ParamType, values: &[f32]) -> Option<Self> {
		let count = ty.float_count()?;
		if values.len() != count {
			return None;
		}
		let mut raw = [0_u8; 64];
		for (chunk, value) in raw.chunks_exact_mut(4).zip(values) {
			chunk.copy_from_slice(&value.to_ne_bytes());
		}
		Self::read(ty, &raw)
	}
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
	let mut out = [0_u8; N];
	out.copy_from_slice(&bytes[..N]);
	out
}

fn floats<const N: usize>(bytes: &[u8]) -> [f32; N] {
	let mut out = [0_f32; N];
	for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
		*slot = f32::from_ne_bytes(array(chunk));
	}
	out
}

fn write_floats(values: &[f32], out: &mut [u8]) {
	for (chunk, value) in out.chunks_exact_mut(4).zip(values) {
		chunk.copy_from_slice(&value.to_ne_bytes());
	}
}

/// Rust types readable and writable through a handle.
pub trait ScalarValue: Sized {
	/// Type tag this Rust type maps to.
	const TYPE: ParamType;

	/// Extract from a dynamic scalar of matching tag.
	fn from_scalar(value: Scalar) -> Option<Self>;

	/// Wrap into a dynamic scalar.
	fn into_scalar(self) -> Scalar;
}

macro_rules! scalar_value {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl ScalarValue for $ty {
				const TYPE: ParamType = ParamType::$variant;

				fn from_scalar(value: Scalar) -> Option<Self> {
					match value {
						Scalar::$variant(inner) => Some(inner),
						_ => None,
					}
				}

				fn into_scalar(self) -> Scalar {
					Scalar::$variant(self)
				}
			}
		)*
	};
}

scalar_value! {
	bool => Bool,
	i8 => I8,
	i16 => I16,
	i32 => I32,
	i64 => I64,
	u8 => U8,
	u16 => U16,
	u32 => U32,
	u64 => U64,
	f32 => F32,
	f64 => F64,
	[f32; 3] => Vec3,
	Bounds3 => Bounds3,
}

#[cfg(test)]
mod tests {
	use super::{Bounds3, ParamType, Scalar};

	#[test]
	fn bounds_survive_byte_encoding() {
		let value = Scalar::Bounds3(Bounds3 {
			min: [-1.0, -2.0, -3.0],
			max: [1.0, 2.0, 3.0],
		});
		let mut raw = [0_u8; 24];
		value.write(&mut raw);
		assert_eq!(Scalar::read(ParamType::Bounds3, &raw), Some(value));
	}

	#[test]
	fn containers_have_no_scalar_layout() {
		for ty in [ParamType::Struct, ParamType::Array, ParamType::Ref, ParamType::String] {
			assert!(ty.scalar_layout().is_none());
			assert!(Scalar::zero(ty).is_none());
		}
	}

	#[test]
	fn components_require_exact_count() {
		assert_eq!(Scalar::from_components(ParamType::Vec3, &[1.0, 2.0, 3.0]), Some(Scalar::Vec3([1.0, 2.0, 3.0])));
		assert_eq!(Scalar::from_components(ParamType::Vec3, &[1.0, 2.0]), None);
		assert_eq!(Scalar::from_components(ParamType::U32, &[1.0]), None);
	}

	#[test]
	fn numeric_conversion_rejects_out_of_range() {
		assert_eq!(Scalar::from_int(ParamType::U8, 255), Some(Scalar::U8(255)));
		assert_eq!(Scalar::from_int(ParamType::U8, 256), None);
		assert_eq!(Scalar::from_int(ParamType::I16, -5), Some(Scalar::I16(-5)));
		assert_eq!(Scalar::from_float(ParamType::U32, 7.0), Some(Scalar::U32(7)));
		assert_eq!(Scalar::from_float(ParamType::U32, 7.5), None);
		assert_eq!(Scalar::from_int(ParamType::Bool, 1), None);
	}
}
