//! ELF64 structure definitions consumed by the loader

use bitflags::bitflags;

use crate::abi::*;

// ============================================================================
// ELF Program Header
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Phdr {
    pub p_type: u32,   // Segment type
    pub p_flags: u32,  // Segment flags
    pub p_offset: u64, // Segment file offset
    pub p_vaddr: u64,  // Segment virtual address
    pub p_paddr: u64,  // Segment physical address
    pub p_filesz: u64, // Segment size in file
    pub p_memsz: u64,  // Segment size in memory
    pub p_align: u64,  // Segment alignment
}

/// Size of one 64-bit program header record.
pub const PHDR_SIZE: usize = core::mem::size_of::<Elf64Phdr>();

const _: () = assert!(PHDR_SIZE == 56);

impl Elf64Phdr {
    pub fn segment_type(&self) -> SegmentType {
        SegmentType::from_raw(self.p_type)
    }

    pub fn flags(&self) -> SegmentFlags {
        SegmentFlags::from_bits_truncate(self.p_flags)
    }

    pub fn is_dynamic(&self) -> bool {
        self.p_type == PT_DYNAMIC
    }
}

/// Program header type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Null,
    Load,
    Dynamic,
    Interp,
    Note,
    ShLib,
    Phdr,
    Tls,
    Other(u32),
}

impl SegmentType {
    pub const fn from_raw(value: u32) -> Self {
        match value {
            PT_NULL => SegmentType::Null,
            PT_LOAD => SegmentType::Load,
            PT_DYNAMIC => SegmentType::Dynamic,
            PT_INTERP => SegmentType::Interp,
            PT_NOTE => SegmentType::Note,
            PT_SHLIB => SegmentType::ShLib,
            PT_PHDR => SegmentType::Phdr,
            PT_TLS => SegmentType::Tls,
            other => SegmentType::Other(other),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SegmentType::Null => "PT_NULL",
            SegmentType::Load => "PT_LOAD",
            SegmentType::Dynamic => "PT_DYNAMIC",
            SegmentType::Interp => "PT_INTERP",
            SegmentType::Note => "PT_NOTE",
            SegmentType::ShLib => "PT_SHLIB",
            SegmentType::Phdr => "PT_PHDR",
            SegmentType::Tls => "PT_TLS",
            SegmentType::Other(_) => "PT_?",
        }
    }
}

bitflags! {
    /// Segment permission flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        const EXECUTE = PF_X;
        const WRITE = PF_W;
        const READ = PF_R;
    }
}

// ============================================================================
// ELF Dynamic Entry
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Elf64Dyn {
    pub d_tag: i64,
    pub d_val: u64,
}
