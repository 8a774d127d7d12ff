//! Shared test helpers for paramtree workspace crates.

use std::path::{Path, PathBuf};

/// Workspace root, two levels above this crate.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	let root = manifest_dir.join("..").join("..");
	root.canonicalize().unwrap_or(root)
}

/// Path of an image fixture under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Parse a JSON fixture.
pub fn read_fixture_json(name: &str) -> serde_json::Value {
	let path = fixture_path(name);
	let bytes = std::fs::read(&path).unwrap_or_else(|err| panic!("fixture {} unreadable: {err}", path.display()));
	serde_json::from_slice(&bytes).unwrap_or_else(|err| panic!("fixture {} is not json: {err}", path.display()))
}

/// Workspace target directory, honoring `CARGO_TARGET_DIR`.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Fresh scratch directory under the target dir for files written by a test.
pub fn scratch_dir(test: &str) -> PathBuf {
	let dir = target_dir().join("paramtree-scratch").join(test);
	let _ = std::fs::remove_dir_all(&dir);
	std::fs::create_dir_all(&dir).unwrap_or_else(|err| panic!("scratch dir {} not created: {err}", dir.display()));
	dir
}
