//! Minimal AppImage builder.
//!
//! Packs a directory into a single self-contained executable: a precompiled
//! runtime stub, followed by a zstd squashfs image of the directory, with an
//! MD5 content digest embedded into a reserved ELF section of the finished
//! file.
//!
//! - **Artifact builders** - mksquashfs wrapper with offset support
//! - **ELF section lookup** - finds the reserved digest/signature/key
//!   sections across 32-bit and 64-bit runtimes
//! - **Digest engine** - self-contained MD5, for deployment targets with no
//!   crypto library
//! - **Build pipeline** - pack, embed runtime, embed digest
//!
//! # Example
//!
//! ```rust,ignore
//! use appimage_builder::{build_appimage, runtime};
//! use std::path::Path;
//!
//! build_appimage(
//!     Path::new("MyApp.AppDir"),
//!     Path::new("MyApp.AppImage"),
//!     &runtime::runtime_path(),
//! )?;
//! ```

pub mod artifact;
pub mod build;
pub mod elf;
pub mod md5;
pub mod preflight;
pub mod process;
pub mod runtime;

pub use build::{build_appimage, embed_digest, embed_runtime};
pub use elf::{find_section, SectionStat};
