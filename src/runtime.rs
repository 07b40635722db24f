//! Runtime stub loading.
//!
//! Every AppImage starts with the same precompiled, position-independent
//! runtime executable. Its own build leaves the digest, signature, and
//! signing-key sections zero-filled; this tool only ever patches the digest
//! section.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Installed location of the runtime stub.
pub const DEFAULT_RUNTIME_PATH: &str = "/usr/local/lib/appimage-builder/runtime";

/// Environment variable overriding [`DEFAULT_RUNTIME_PATH`].
pub const RUNTIME_PATH_ENV: &str = "APPIMAGE_BUILDER_RUNTIME";

/// Resolve the runtime stub path, honoring the environment override.
pub fn runtime_path() -> PathBuf {
    std::env::var_os(RUNTIME_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNTIME_PATH))
}

/// Read the whole runtime stub into memory.
///
/// Loaded once per run and treated as read-only afterwards.
pub fn load_runtime(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading runtime stub '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_runtime_missing() {
        let err = load_runtime(Path::new("/nonexistent_runtime_12345")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent_runtime_12345"));
    }

    #[test]
    fn test_load_runtime() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runtime");
        fs::write(&path, b"stub bytes").unwrap();
        assert_eq!(load_runtime(&path).unwrap(), b"stub bytes");
    }
}
