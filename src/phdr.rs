//! Program header scanning and dynamic segment location

use core::slice;

use x86_64::VirtAddr;

use crate::auxv::ExecutableInfo;
use crate::elf::{Elf64Dyn, Elf64Phdr, PHDR_SIZE};
use crate::error::BootstrapError;
use crate::raw::RawReader;

/// The running executable's program header table.
#[derive(Clone, Copy)]
pub struct ProgramHeaderTable<'a> {
    reader: RawReader<'a>,
    count: usize,
    stride: usize,
}

impl<'a> ProgramHeaderTable<'a> {
    /// `count` records spaced `stride` bytes apart at the start of `bytes`.
    pub fn new(bytes: &'a [u8], count: u64, stride: u64) -> Result<Self, BootstrapError> {
        let overflow = BootstrapError::ProgramHeaderTableOverflow {
            count,
            entry_size: stride,
        };
        if stride < PHDR_SIZE as u64 {
            return Err(BootstrapError::ProgramHeaderSize(stride));
        }
        let count = usize::try_from(count).map_err(|_| overflow)?;
        let stride = usize::try_from(stride).map_err(|_| overflow)?;
        let size = count.checked_mul(stride).ok_or(overflow)?;
        let reader = RawReader::new(bytes).sub(0, size)?;
        Ok(Self {
            reader,
            count,
            stride,
        })
    }

    /// View the table the kernel mapped at `AT_PHDR`.
    ///
    /// # Safety
    ///
    /// `info` must come from validating the running process's own auxiliary
    /// vector, so that `AT_PHDR .. AT_PHDR + AT_PHNUM * AT_PHENT` is mapped
    /// and readable for the rest of the process lifetime.
    pub unsafe fn from_info(info: &ExecutableInfo) -> Result<ProgramHeaderTable<'static>, BootstrapError> {
        let overflow = BootstrapError::ProgramHeaderTableOverflow {
            count: info.program_header_count,
            entry_size: info.program_header_size,
        };
        let size = info
            .program_header_count
            .checked_mul(info.program_header_size)
            .ok_or(overflow)?;
        info.program_headers
            .as_u64()
            .checked_add(size)
            .ok_or(overflow)?;
        let size = usize::try_from(size).map_err(|_| overflow)?;
        let bytes: &'static [u8] = if size == 0 {
            &[]
        } else {
            slice::from_raw_parts(info.program_headers.as_ptr::<u8>(), size)
        };
        ProgramHeaderTable::new(bytes, info.program_header_count, info.program_header_size)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, index: usize) -> Option<Elf64Phdr> {
        if index >= self.count {
            return None;
        }
        self.reader.read::<Elf64Phdr>(index * self.stride).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Elf64Phdr> + 'a {
        let table = *self;
        (0..table.count).filter_map(move |index| table.get(index))
    }

    /// The last `PT_DYNAMIC` record; a well-formed image has at most one.
    pub fn find_dynamic(&self) -> Option<Elf64Phdr> {
        self.iter().filter(Elf64Phdr::is_dynamic).last()
    }
}

/// Where the executable's dynamic section lives in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicSegment {
    address: VirtAddr,
    header: Elf64Phdr,
}

impl DynamicSegment {
    pub fn address(&self) -> VirtAddr {
        self.address
    }

    pub fn header(&self) -> &Elf64Phdr {
        &self.header
    }

    /// First `Elf64_Dyn` entry, the read point for relocation processing.
    pub fn as_ptr(&self) -> *const Elf64Dyn {
        self.address.as_ptr()
    }
}

/// Find the dynamic segment and place it relative to the executable base.
///
/// `Ok(None)` means the image has no `PT_DYNAMIC` and needs no dynamic
/// linking.
pub fn locate_dynamic(
    table: &ProgramHeaderTable<'_>,
    base: VirtAddr,
) -> Result<Option<DynamicSegment>, BootstrapError> {
    let Some(header) = table.find_dynamic() else {
        return Ok(None);
    };

    let out_of_range = BootstrapError::DynamicSegmentOutOfRange {
        base: base.as_u64(),
        offset: header.p_offset,
    };
    let address = base
        .as_u64()
        .checked_add(header.p_offset)
        .ok_or(out_of_range)?;
    let address = VirtAddr::try_new(address).map_err(|_| out_of_range)?;

    Ok(Some(DynamicSegment { address, header }))
}
