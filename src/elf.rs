//! ELF section lookup.
//!
//! The runtime stub reserves three named sections (see [`section_names`])
//! that the build pipeline patches after the artifact is assembled. This
//! module finds a section's byte range by walking the section-header table
//! of the finished artifact, for both 32-bit and 64-bit ELF files.
//!
//! Everything is bounds-checked against the input buffer: a truncated or
//! corrupt header produces an error, never a panic or an out-of-bounds
//! read.

use anyhow::{bail, Context, Result};

/// Names of the reserved sections in the runtime stub.
///
/// Only `DIGEST` is ever populated by this tool; `SIGNATURE` and
/// `SIGNING_KEY` are zero placeholders reserved for external signing.
pub mod section_names {
    pub const DIGEST: &str = ".digest_md5";
    pub const SIGNATURE: &str = ".sha256_sig";
    pub const SIGNING_KEY: &str = ".sig_key";
}

/// Byte offset of `e_ident[EI_CLASS]` in the ELF identification block.
const EI_CLASS: usize = 4;

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;

/// Byte range of a section within the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStat {
    pub offset: u64,
    pub length: u64,
}

/// Field positions for one ELF addressing width.
///
/// Both widths are parsed by the same linear scan; only these constants
/// differ between them.
struct Layout {
    /// Offset of `e_shoff` in the file header, and its width in bytes.
    shoff_pos: usize,
    shoff_wide: bool,
    /// Offset of `e_shnum` in the file header.
    shnum_pos: usize,
    /// Offset of `e_shstrndx` in the file header.
    shstrndx_pos: usize,
    /// Size of one section-header entry.
    shent_size: usize,
    /// Offsets of `sh_offset` / `sh_size` within an entry, and their width.
    sh_offset_pos: usize,
    sh_size_pos: usize,
    sh_field_wide: bool,
}

/// ELF addressing width, read from `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElfClass {
    Elf32,
    Elf64,
}

const LAYOUT32: Layout = Layout {
    shoff_pos: 0x20,
    shoff_wide: false,
    shnum_pos: 0x30,
    shstrndx_pos: 0x32,
    shent_size: 40,
    sh_offset_pos: 16,
    sh_size_pos: 20,
    sh_field_wide: false,
};

const LAYOUT64: Layout = Layout {
    shoff_pos: 0x28,
    shoff_wide: true,
    shnum_pos: 0x3c,
    shstrndx_pos: 0x3e,
    shent_size: 64,
    sh_offset_pos: 24,
    sh_size_pos: 32,
    sh_field_wide: true,
};

impl ElfClass {
    fn from_ident(data: &[u8]) -> Result<Self> {
        let class = *data
            .get(EI_CLASS)
            .context("artifact too short to hold an ELF identification block")?;
        match class {
            ELFCLASS32 => Ok(ElfClass::Elf32),
            ELFCLASS64 => Ok(ElfClass::Elf64),
            other => bail!(
                "unsupported ELF class {}: only 32-bit and 64-bit objects are supported",
                other
            ),
        }
    }

    fn layout(self) -> &'static Layout {
        match self {
            ElfClass::Elf32 => &LAYOUT32,
            ElfClass::Elf64 => &LAYOUT64,
        }
    }
}

/// Find the byte range of the section named `name`.
///
/// Re-parses the header on every call; lookups are stateless and cheap
/// next to the hashing the pipeline does afterwards.
pub fn find_section(data: &[u8], name: &str) -> Result<SectionStat> {
    let layout = ElfClass::from_ident(data)?.layout();

    let shoff = read_addr(data, layout.shoff_pos, layout.shoff_wide)
        .context("section-header table offset lies outside the artifact header")?;
    let shnum = read_u16(data, layout.shnum_pos)
        .context("section-header count lies outside the artifact header")? as usize;
    let shstrndx = read_u16(data, layout.shstrndx_pos)
        .context("string-table index lies outside the artifact header")? as usize;

    if shstrndx >= shnum {
        bail!(
            "section-name string table index {} out of range ({} entries)",
            shstrndx,
            shnum
        );
    }

    // The string table is itself described by a section-header entry; all
    // section names live at str_tab + sh_name as NUL-terminated strings.
    let strtab_entry = entry(data, layout, shoff, shstrndx)?;
    let strtab_off = read_addr(strtab_entry, layout.sh_offset_pos, layout.sh_field_wide)
        .context("string-table entry truncated")? as usize;
    let strtab = data
        .get(strtab_off..)
        .context("section-name string table lies outside the artifact")?;

    for index in 0..shnum {
        let ent = entry(data, layout, shoff, index)?;
        let name_off = read_u32(ent, 0).context("section-header entry truncated")? as usize;
        if section_name(strtab, name_off)? == name.as_bytes() {
            let offset = read_addr(ent, layout.sh_offset_pos, layout.sh_field_wide)
                .context("section-header entry truncated")?;
            let length = read_addr(ent, layout.sh_size_pos, layout.sh_field_wide)
                .context("section-header entry truncated")?;
            return Ok(SectionStat { offset, length });
        }
    }

    bail!("section {} not found in the artifact's ELF header", name)
}

/// Slice out section-header entry `index`.
fn entry<'a>(data: &'a [u8], layout: &Layout, shoff: u64, index: usize) -> Result<&'a [u8]> {
    let start = (shoff as usize)
        .checked_add(
            index
                .checked_mul(layout.shent_size)
                .context("section-header table too large")?,
        )
        .context("section-header table too large")?;
    let end = start
        .checked_add(layout.shent_size)
        .context("section-header table too large")?;
    data.get(start..end).with_context(|| {
        format!(
            "section-header entry {} lies outside the artifact ({} bytes)",
            index,
            data.len()
        )
    })
}

/// Resolve a NUL-terminated name at `offset` within the string table.
fn section_name(strtab: &[u8], offset: usize) -> Result<&[u8]> {
    let tail = strtab
        .get(offset..)
        .context("section name offset lies outside the string table")?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .context("section name is not NUL-terminated")?;
    Ok(&tail[..len])
}

fn read_u16(data: &[u8], pos: usize) -> Option<u16> {
    Some(u16::from_le_bytes(data.get(pos..pos + 2)?.try_into().ok()?))
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    Some(u32::from_le_bytes(data.get(pos..pos + 4)?.try_into().ok()?))
}

/// Read a 32-bit or 64-bit little-endian field, widened to u64.
fn read_addr(data: &[u8], pos: usize, wide: bool) -> Option<u64> {
    if wide {
        Some(u64::from_le_bytes(data.get(pos..pos + 8)?.try_into().ok()?))
    } else {
        read_u32(data, pos).map(u64::from)
    }
}
