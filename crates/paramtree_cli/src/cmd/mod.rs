/// Registered class listing command.
pub mod classes;
/// Single field lookup command.
pub mod get;
/// Default image writer command.
pub mod new;
/// Value tree rendering helpers.
pub mod print;
/// Definition tree and lookup table inspection command.
pub mod schema;
/// Image value dump command.
pub mod show;
pub(crate) mod util;
