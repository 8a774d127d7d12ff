//! Schema-driven reflection and lifecycle engine for parameterized asset data.

/// Class schemas, handles, instances, and images.
pub mod param;
