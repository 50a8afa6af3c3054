//! Auxiliary vector classification
//!
//! The kernel's `(tag, value)` pairs are decoded once into [`AuxEntry`] values
//! and filed into an [`AuxTable`] indexed by tag. Validation then decides
//! whether the image carries enough information to find its program headers.

use core::fmt;

use spin::Once;
use x86_64::VirtAddr;

use crate::abi::*;
use crate::elf::PHDR_SIZE;
use crate::error::{BootstrapError, Region};
use crate::stack::AuxVector;

// ============================================================================
// Tags
// ============================================================================

/// Auxiliary vector tags this loader understands. `AT_NULL` only terminates
/// the vector and never becomes an entry.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxTag {
    Ignore = AT_IGNORE,
    ExecFd = AT_EXECFD,
    ProgramHeaders = AT_PHDR,
    ProgramHeaderSize = AT_PHENT,
    ProgramHeaderCount = AT_PHNUM,
    PageSize = AT_PAGESZ,
    Base = AT_BASE,
    Flags = AT_FLAGS,
    Entry = AT_ENTRY,
    NotElf = AT_NOTELF,
    Uid = AT_UID,
    Euid = AT_EUID,
    Gid = AT_GID,
    Egid = AT_EGID,
    Platform = AT_PLATFORM,
}

impl AuxTag {
    pub const fn from_raw(tag: u64) -> Option<Self> {
        match tag {
            AT_IGNORE => Some(AuxTag::Ignore),
            AT_EXECFD => Some(AuxTag::ExecFd),
            AT_PHDR => Some(AuxTag::ProgramHeaders),
            AT_PHENT => Some(AuxTag::ProgramHeaderSize),
            AT_PHNUM => Some(AuxTag::ProgramHeaderCount),
            AT_PAGESZ => Some(AuxTag::PageSize),
            AT_BASE => Some(AuxTag::Base),
            AT_FLAGS => Some(AuxTag::Flags),
            AT_ENTRY => Some(AuxTag::Entry),
            AT_NOTELF => Some(AuxTag::NotElf),
            AT_UID => Some(AuxTag::Uid),
            AT_EUID => Some(AuxTag::Euid),
            AT_GID => Some(AuxTag::Gid),
            AT_EGID => Some(AuxTag::Egid),
            AT_PLATFORM => Some(AuxTag::Platform),
            _ => None,
        }
    }

    pub const fn raw(self) -> u64 {
        self as u64
    }

    pub const fn name(self) -> &'static str {
        match self {
            AuxTag::Ignore => "AT_IGNORE",
            AuxTag::ExecFd => "AT_EXECFD",
            AuxTag::ProgramHeaders => "AT_PHDR",
            AuxTag::ProgramHeaderSize => "AT_PHENT",
            AuxTag::ProgramHeaderCount => "AT_PHNUM",
            AuxTag::PageSize => "AT_PAGESZ",
            AuxTag::Base => "AT_BASE",
            AuxTag::Flags => "AT_FLAGS",
            AuxTag::Entry => "AT_ENTRY",
            AuxTag::NotElf => "AT_NOTELF",
            AuxTag::Uid => "AT_UID",
            AuxTag::Euid => "AT_EUID",
            AuxTag::Gid => "AT_GID",
            AuxTag::Egid => "AT_EGID",
            AuxTag::Platform => "AT_PLATFORM",
        }
    }

    /// Tags whose presence alone makes the image unloadable.
    pub const fn is_hard_stop(self) -> bool {
        matches!(self, AuxTag::ExecFd | AuxTag::NotElf)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Address the loaded program starts executing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint(VirtAddr);

impl EntryPoint {
    pub const fn new(addr: VirtAddr) -> Self {
        Self(addr)
    }

    pub const fn addr(self) -> VirtAddr {
        self.0
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.as_u64())
    }
}

/// A recognized auxiliary entry with its value in the type the tag implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxEntry {
    Ignore,
    ExecFd(u64),
    ProgramHeaders(VirtAddr),
    ProgramHeaderSize(u64),
    ProgramHeaderCount(u64),
    PageSize(u64),
    Base(VirtAddr),
    Flags(u64),
    Entry(EntryPoint),
    NotElf(u64),
    Uid(u64),
    Euid(u64),
    Gid(u64),
    Egid(u64),
    /// Points at a NUL-terminated platform name.
    Platform(VirtAddr),
}

impl AuxEntry {
    pub fn decode(tag: AuxTag, value: u64) -> Result<Self, BootstrapError> {
        let address = || {
            VirtAddr::try_new(value).map_err(|_| BootstrapError::NonCanonicalAddress { tag, value })
        };
        Ok(match tag {
            AuxTag::Ignore => AuxEntry::Ignore,
            AuxTag::ExecFd => AuxEntry::ExecFd(value),
            AuxTag::ProgramHeaders => AuxEntry::ProgramHeaders(address()?),
            AuxTag::ProgramHeaderSize => AuxEntry::ProgramHeaderSize(value),
            AuxTag::ProgramHeaderCount => AuxEntry::ProgramHeaderCount(value),
            AuxTag::PageSize => AuxEntry::PageSize(value),
            AuxTag::Base => AuxEntry::Base(address()?),
            AuxTag::Flags => AuxEntry::Flags(value),
            AuxTag::Entry => AuxEntry::Entry(EntryPoint(address()?)),
            AuxTag::NotElf => AuxEntry::NotElf(value),
            AuxTag::Uid => AuxEntry::Uid(value),
            AuxTag::Euid => AuxEntry::Euid(value),
            AuxTag::Gid => AuxEntry::Gid(value),
            AuxTag::Egid => AuxEntry::Egid(value),
            AuxTag::Platform => AuxEntry::Platform(address()?),
        })
    }

    pub const fn tag(&self) -> AuxTag {
        match self {
            AuxEntry::Ignore => AuxTag::Ignore,
            AuxEntry::ExecFd(_) => AuxTag::ExecFd,
            AuxEntry::ProgramHeaders(_) => AuxTag::ProgramHeaders,
            AuxEntry::ProgramHeaderSize(_) => AuxTag::ProgramHeaderSize,
            AuxEntry::ProgramHeaderCount(_) => AuxTag::ProgramHeaderCount,
            AuxEntry::PageSize(_) => AuxTag::PageSize,
            AuxEntry::Base(_) => AuxTag::Base,
            AuxEntry::Flags(_) => AuxTag::Flags,
            AuxEntry::Entry(_) => AuxTag::Entry,
            AuxEntry::NotElf(_) => AuxTag::NotElf,
            AuxEntry::Uid(_) => AuxTag::Uid,
            AuxEntry::Euid(_) => AuxTag::Euid,
            AuxEntry::Gid(_) => AuxTag::Gid,
            AuxEntry::Egid(_) => AuxTag::Egid,
            AuxEntry::Platform(_) => AuxTag::Platform,
        }
    }

    /// The value as the kernel wrote it.
    pub const fn raw_value(&self) -> u64 {
        match *self {
            AuxEntry::Ignore => 0,
            AuxEntry::ExecFd(v)
            | AuxEntry::ProgramHeaderSize(v)
            | AuxEntry::ProgramHeaderCount(v)
            | AuxEntry::PageSize(v)
            | AuxEntry::Flags(v)
            | AuxEntry::NotElf(v)
            | AuxEntry::Uid(v)
            | AuxEntry::Euid(v)
            | AuxEntry::Gid(v)
            | AuxEntry::Egid(v) => v,
            AuxEntry::ProgramHeaders(addr) | AuxEntry::Base(addr) | AuxEntry::Platform(addr) => {
                addr.as_u64()
            }
            AuxEntry::Entry(entry) => entry.0.as_u64(),
        }
    }
}

impl fmt::Display for AuxEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxEntry::Ignore => f.write_str("AT_IGNORE"),
            AuxEntry::ProgramHeaders(addr) | AuxEntry::Base(addr) | AuxEntry::Platform(addr) => {
                write!(f, "{} = {:#x}", self.tag().name(), addr.as_u64())
            }
            AuxEntry::Entry(entry) => write!(f, "AT_ENTRY = {}", entry),
            _ => write!(f, "{} = {}", self.tag().name(), self.raw_value()),
        }
    }
}

// ============================================================================
// Table
// ============================================================================

/// Dense table of recognized entries, indexed by tag value.
///
/// An empty slot means the tag was never seen, which is distinct from a tag
/// seen with value zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxTable {
    slots: [Option<AuxEntry>; AUX_TABLE_LEN],
}

impl AuxTable {
    pub const fn new() -> Self {
        Self {
            slots: [None; AUX_TABLE_LEN],
        }
    }

    /// Walk `auxv` up to its `AT_NULL` terminator, keeping the last entry seen
    /// for every recognized tag. Unknown tags are skipped.
    pub fn scan(auxv: &AuxVector<'_>, max_entries: usize) -> Result<Self, BootstrapError> {
        let mut table = Self::new();
        let mut count = 0usize;

        for pair in auxv.raw_pairs() {
            if pair.tag == AT_NULL {
                return Ok(table);
            }
            count += 1;
            if count > max_entries {
                return Err(BootstrapError::ScanLimitExceeded {
                    region: Region::AuxiliaryVector,
                    limit: max_entries,
                });
            }
            let Some(tag) = AuxTag::from_raw(pair.tag) else {
                crate::ltrace!("ignoring auxv tag {}", pair.tag);
                continue;
            };
            table.insert(AuxEntry::decode(tag, pair.value)?);
        }

        Err(BootstrapError::Unterminated(Region::AuxiliaryVector))
    }

    /// Store `entry`, replacing any previous entry with the same tag.
    pub fn insert(&mut self, entry: AuxEntry) {
        self.slots[entry.tag().slot()] = Some(entry);
    }

    pub fn get(&self, tag: AuxTag) -> Option<AuxEntry> {
        self.slots[tag.slot()]
    }

    pub fn contains(&self, tag: AuxTag) -> bool {
        self.get(tag).is_some()
    }

    /// Entries in tag order.
    pub fn iter(&self) -> impl Iterator<Item = AuxEntry> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn page_size(&self) -> Option<u64> {
        match self.get(AuxTag::PageSize)? {
            AuxEntry::PageSize(size) => Some(size),
            _ => None,
        }
    }

    pub fn program_headers(&self) -> Option<VirtAddr> {
        match self.get(AuxTag::ProgramHeaders)? {
            AuxEntry::ProgramHeaders(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn program_header_size(&self) -> Option<u64> {
        match self.get(AuxTag::ProgramHeaderSize)? {
            AuxEntry::ProgramHeaderSize(size) => Some(size),
            _ => None,
        }
    }

    pub fn program_header_count(&self) -> Option<u64> {
        match self.get(AuxTag::ProgramHeaderCount)? {
            AuxEntry::ProgramHeaderCount(count) => Some(count),
            _ => None,
        }
    }

    pub fn base(&self) -> Option<VirtAddr> {
        match self.get(AuxTag::Base)? {
            AuxEntry::Base(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn entry(&self) -> Option<EntryPoint> {
        match self.get(AuxTag::Entry)? {
            AuxEntry::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// First hard-stop tag present, if any.
    pub fn hard_stop(&self) -> Option<AuxTag> {
        self.iter()
            .map(|entry| entry.tag())
            .find(|tag| tag.is_hard_stop())
    }

    /// Decide whether the image is one this loader can handle.
    pub fn validate(&self) -> Result<ExecutableInfo, BootstrapError> {
        if let Some(tag) = self.hard_stop() {
            return Err(BootstrapError::HardStop(tag));
        }

        let missing = BootstrapError::MissingAuxEntry;
        let page_size = self.page_size().ok_or(missing(AuxTag::PageSize))?;
        let program_headers = self
            .program_headers()
            .ok_or(missing(AuxTag::ProgramHeaders))?;
        let program_header_count = self
            .program_header_count()
            .ok_or(missing(AuxTag::ProgramHeaderCount))?;
        let program_header_size = self
            .program_header_size()
            .ok_or(missing(AuxTag::ProgramHeaderSize))?;

        if program_header_size < PHDR_SIZE as u64 {
            return Err(BootstrapError::ProgramHeaderSize(program_header_size));
        }

        Ok(ExecutableInfo {
            page_size,
            program_headers,
            program_header_size,
            program_header_count,
            base: self.base().unwrap_or(VirtAddr::zero()),
            entry: self.entry(),
        })
    }
}

impl Default for AuxTable {
    fn default() -> Self {
        Self::new()
    }
}

/// What a validated auxiliary vector tells the loader about the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutableInfo {
    pub page_size: u64,
    pub program_headers: VirtAddr,
    pub program_header_size: u64,
    pub program_header_count: u64,
    /// `AT_BASE`, zero when the kernel did not provide one.
    pub base: VirtAddr,
    pub entry: Option<EntryPoint>,
}

// ============================================================================
// Process-wide Storage
// ============================================================================

static PUBLISHED: Once<AuxTable> = Once::new();

/// Make a validated table available to later loader stages. Only the first
/// call stores anything.
pub fn publish(table: AuxTable) -> &'static AuxTable {
    PUBLISHED.call_once(|| table)
}

pub fn published() -> Option<&'static AuxTable> {
    PUBLISHED.get()
}

/// `getauxval`-style lookup against the published table.
pub fn lookup(tag: AuxTag) -> Option<AuxEntry> {
    published()?.get(tag)
}
