//! The AppImage build pipeline.
//!
//! Four stages, strictly sequential, mutating the destination file in
//! place:
//!
//! 1. `mksquashfs` packs the source directory, leaving a gap at the start
//!    of the file the size of the runtime stub.
//! 2. The runtime stub is written into the gap and the file is made
//!    executable.
//! 3. The reserved digest/signature/signing-key sections are located in the
//!    finished file's ELF header.
//! 4. An MD5 of the whole file is computed with those sections zeroed and
//!    written into the digest section.
//!
//! The zero-then-hash step resolves the circular dependency between the
//! digest and the bytes it occupies: hashing always happens on an in-memory
//! copy with all three sections cleared, so the embedded digest is
//! independent of whatever those sections held before (their build-time
//! zeros, or a previous build's digest).

use anyhow::{bail, Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::artifact::squashfs::{build_squashfs, SquashfsOptions};
use crate::elf::{find_section, section_names, SectionStat};
use crate::md5;
use crate::preflight;
use crate::runtime;

/// Build an AppImage from `source_dir` at `destination`.
///
/// `runtime_path` points at the runtime stub, normally
/// [`runtime::runtime_path()`]. Every failure is fatal; no stage retries
/// and nothing restores the destination to a prior state.
pub fn build_appimage(source_dir: &Path, destination: &Path, runtime_path: &Path) -> Result<()> {
    preflight::check_host_tools()?;

    let runtime = runtime::load_runtime(runtime_path)?;

    let options = SquashfsOptions {
        offset: runtime.len() as u64,
        ..Default::default()
    };
    build_squashfs(source_dir, destination, &options)?;

    embed_runtime(destination, &runtime)?;
    embed_digest(destination)?;

    println!("AppImage created: {}", destination.display());
    Ok(())
}

/// Write the runtime stub over the gap mksquashfs reserved and mark the
/// artifact executable (0755).
pub fn embed_runtime(destination: &Path, runtime: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(destination)
        .with_context(|| {
            format!("opening AppImage '{}' for writing", destination.display())
        })?;
    file.seek(SeekFrom::Start(0))
        .with_context(|| format!("seeking in AppImage '{}'", destination.display()))?;
    file.write_all(runtime)
        .with_context(|| format!("embedding runtime into '{}'", destination.display()))?;
    drop(file);

    fs::set_permissions(destination, fs::Permissions::from_mode(0o755)).with_context(|| {
        format!("marking AppImage '{}' as executable", destination.display())
    })?;
    Ok(())
}

/// Compute the artifact digest and write it into the digest section.
///
/// The hash input is a copy of the whole file with the digest, signature,
/// and signing-key sections zeroed. The file itself is only touched by the
/// final 16-byte write.
pub fn embed_digest(destination: &Path) -> Result<()> {
    let mut image = fs::read(destination)
        .with_context(|| format!("reading AppImage '{}'", destination.display()))?;

    let digest_section = find_section(&image, section_names::DIGEST)?;
    let signature_section = find_section(&image, section_names::SIGNATURE)?;
    let key_section = find_section(&image, section_names::SIGNING_KEY)?;

    if digest_section.length < md5::DIGEST_LEN as u64 {
        bail!(
            "{} section in the runtime's ELF header is too small \
             (found {} bytes, minimum required: {} bytes)",
            section_names::DIGEST,
            digest_section.length,
            md5::DIGEST_LEN
        );
    }

    for section in [&digest_section, &signature_section, &key_section] {
        zero_section(&mut image, section)?;
    }

    let digest = md5::digest(&image);

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(destination)
        .with_context(|| {
            format!("opening AppImage '{}' for updating", destination.display())
        })?;
    file.seek(SeekFrom::Start(digest_section.offset))
        .context("embedding digest: could not seek to section offset")?;
    file.write_all(&digest)
        .context("embedding digest: write failed")?;
    Ok(())
}

/// Zero one section in the in-memory copy used for hashing.
fn zero_section(image: &mut [u8], section: &SectionStat) -> Result<()> {
    let start = section.offset as usize;
    let end = start
        .checked_add(section.length as usize)
        .filter(|&end| end <= image.len())
        .with_context(|| {
            format!(
                "section at offset {} (length {}) lies outside the artifact ({} bytes)",
                section.offset,
                section.length,
                image.len()
            )
        })?;
    image[start..end].fill(0);
    Ok(())
}
