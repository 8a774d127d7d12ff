use thiserror::Error;

use crate::param::ParamType;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ParamError>;

/// Errors produced while navigating, mutating, and (de)serializing parameterized instances.
#[derive(Debug, Error)]
pub enum ParamError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Image JSON could not be parsed or written.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Path expression syntax is invalid.
	#[error("invalid field path: {path}")]
	InvalidFieldPath {
		/// Original user-provided path string.
		path: String,
	},
	/// A handle step named a missing child or an index past the current extent.
	#[error("index out of range in {path} at step {step}")]
	IndexOutOfRange {
		/// Path (or rendered handle) being resolved.
		path: String,
		/// Zero-based step that failed.
		step: usize,
	},
	/// Operation applied to a field with another type tag.
	#[error("type mismatch: expected {expected}, got {got}")]
	TypeMismatch {
		/// Type tag the operation requires.
		expected: &'static str,
		/// Type tag of the addressed field.
		got: ParamType,
	},
	/// Reference assignment violates the field's class whitelist.
	#[error("invalid reference variant {class} (allowed: {allowed})")]
	InvalidVariant {
		/// Class name of the rejected instance.
		class: String,
		/// Comma-separated whitelist of the field.
		allowed: String,
	},
	/// Serialized layout does not match the registered class layout.
	#[error("checksum mismatch for {class}: expected {expected}, found {found}")]
	ChecksumMismatch {
		/// Class name carried by the image.
		class: String,
		/// Checksum of the registered class.
		expected: String,
		/// Checksum carried by the image.
		found: String,
	},
	/// Traits allocator returned no memory.
	#[error("allocation failure: size={size}, align={align}")]
	AllocationFailure {
		/// Requested byte size.
		size: usize,
		/// Requested alignment.
		align: usize,
	},
	/// In-place buffer does not satisfy the class alignment.
	#[error("unaligned buffer for class {class} (align={align})")]
	UnalignedBuffer {
		/// Class being created in place.
		class: &'static str,
		/// Required alignment.
		align: usize,
	},
	/// Class name is not known to the registry.
	#[error("unknown class: {name}")]
	UnknownClass {
		/// Requested class name.
		name: String,
	},
	/// Image bytes start with neither JSON nor a zstd frame.
	#[error("unknown image encoding (magic={magic:?})")]
	UnknownImageMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Image value does not fit the class schema.
	#[error("image value at {path}: {reason}")]
	ImageValue {
		/// Long name of the offending field.
		path: String,
		/// Human-readable mismatch description.
		reason: String,
	},
}
