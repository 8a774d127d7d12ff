mod block;
mod class;
pub mod classes;
mod compression;
mod definition;
pub mod desc;
mod error;
mod handle;
mod image;
mod instance;
mod lookup;
mod path;
mod registry;
mod storage;
#[cfg(test)]
mod test_support;
mod traits;
mod types;
mod value;

/// Traits-allocated memory block.
pub use block::Block;
/// Class descriptor and its shared schema.
pub use class::{ClassDescriptor, ClassSchema};
/// Image encoding detection.
pub use compression::Compression;
/// Definition tree types.
pub use definition::{DefinitionNode, DefinitionTree, NodeId};
/// Error and result aliases.
pub use error::{ParamError, Result};
/// Handle paths and resolution output.
pub use handle::{Handle, HandleStep, ResolvedField};
/// Serialized images and file helpers.
pub use image::{Image, ImageOptions, read_image, write_image};
/// Concrete instances.
pub use instance::{ArrayInfo, Instance};
/// Flattened lookup table.
pub use lookup::{LookupNode, LookupTable};
/// Dotted name parser.
pub use path::{FieldPath, PathStep};
/// Class name registry.
pub use registry::Registry;
/// Allocator capability and implementations.
pub use traits::{AllocEvent, HeapTraits, Traits, TrackingTraits};
/// Type tags and plain-data values.
pub use types::{ArraySize, Bounds3, ParamType, Scalar, ScalarValue};
/// Exported value tree.
pub use value::{ExportOptions, Value};
