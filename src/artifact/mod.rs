//! Artifact builders.
//!
//! - [`squashfs`] - Compressed filesystem images (mksquashfs)

pub mod squashfs;
