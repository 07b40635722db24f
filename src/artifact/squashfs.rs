//! Squashfs image builder.
//!
//! Wraps `mksquashfs` for creating the compressed filesystem image that
//! follows the runtime stub inside an AppImage. squashfs-tools 4.4 or later
//! is required for zstd compression and `-offset` support.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::process::{self, Cmd};

/// Options for building a squashfs image.
#[derive(Debug, Clone)]
pub struct SquashfsOptions<'a> {
    /// Compression algorithm. The AppImage runtime expects zstd.
    pub compression: &'a str,

    /// Block size (e.g., "128K", "1M").
    ///
    /// Larger blocks = better compression, more memory usage.
    pub block_size: &'a str,

    /// Number of bytes to leave untouched at the start of the output file.
    ///
    /// The pipeline sets this to the runtime stub length and writes the stub
    /// into the gap afterwards.
    pub offset: u64,
}

impl Default for SquashfsOptions<'_> {
    fn default() -> Self {
        Self {
            compression: "zstd",
            block_size: "1M",
            offset: 0,
        }
    }
}

/// Build a squashfs image from a directory.
///
/// Always starts from a fresh output file (`-noappend`), attributes every
/// entry to root (`-root-owned`), and pins the filesystem timestamp to the
/// epoch (`-mkfs-time 0`) so identical input trees produce identical images.
///
/// Any failure of the `mksquashfs` subprocess aborts the build; a partially
/// written image is never usable.
pub fn build_squashfs(source_dir: &Path, output: &Path, options: &SquashfsOptions) -> Result<()> {
    if !source_dir.exists() {
        bail!("Source directory does not exist: {}", source_dir.display());
    }
    if !source_dir.is_dir() {
        bail!("Source path is not a directory: {}", source_dir.display());
    }

    if !process::exists("mksquashfs") {
        bail!(
            "mksquashfs not found. Install squashfs-tools:\n\
             On Fedora: sudo dnf install squashfs-tools\n\
             On Ubuntu: sudo apt install squashfs-tools\n\
             On Arch: sudo pacman -S squashfs-tools\n\
             \n\
             NOTE: squashfs-tools 4.4+ required for zstd and -offset."
        );
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }

    println!(
        "Creating squashfs with {} compression (offset {})...",
        options.compression, options.offset
    );

    Cmd::new("mksquashfs")
        .arg_path(source_dir)
        .arg_path(output)
        .args(["-offset", &options.offset.to_string()])
        .args(["-comp", options.compression])
        .arg("-root-owned")
        .arg("-noappend")
        .args(["-b", options.block_size])
        .args(["-mkfs-time", "0"])
        .error_msg(
            "mksquashfs failed. Install squashfs-tools: sudo dnf install squashfs-tools\n\
             NOTE: squashfs-tools 4.4+ required for zstd and -offset.",
        )
        .run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_validation() {
        let result = build_squashfs(
            Path::new("/nonexistent_path_12345"),
            Path::new("/tmp/test.squashfs"),
            &SquashfsOptions::default(),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_source_not_directory() {
        // /dev/null exists but is not a directory
        let result = build_squashfs(
            Path::new("/dev/null"),
            Path::new("/tmp/test.squashfs"),
            &SquashfsOptions::default(),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_build_with_offset() {
        if !process::exists("mksquashfs") {
            eprintln!("mksquashfs not installed; skipping");
            return;
        }

        let temp = tempfile::TempDir::new().unwrap();
        let source = temp.path().join("source");
        let output = temp.path().join("image.squashfs");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("hello.txt"), "hello\n").unwrap();

        let options = SquashfsOptions {
            offset: 128,
            ..Default::default()
        };
        build_squashfs(&source, &output, &options).unwrap();

        // The gap before the offset belongs to the caller; image data
        // starts at the offset, so the file must be strictly larger.
        let len = fs::metadata(&output).unwrap().len();
        assert!(len > 128);
    }
}
