//! Bootstrap failures and the exit statuses they map to

use core::fmt;

use crate::auxv::AuxTag;
use crate::raw::RawAccessError;

/// Process exit status reported by the loader itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    /// The process image cannot be handled by this loader.
    pub const UNSUPPORTED_FORMAT: ExitCode = ExitCode(1);
    /// An internal invariant failed (panic).
    pub const ASSERTION: ExitCode = ExitCode(666);
}

/// Region of the initial stack image being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Arguments,
    Environment,
    AuxiliaryVector,
}

impl Region {
    pub const fn as_str(self) -> &'static str {
        match self {
            Region::Arguments => "argument vector",
            Region::Environment => "environment vector",
            Region::AuxiliaryVector => "auxiliary vector",
        }
    }
}

/// Everything that makes the loader give up on a process image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapError {
    /// Entry stack pointer is null or not word aligned.
    BadStackPointer(u64),
    /// A read fell outside the bounded view.
    Access(RawAccessError),
    /// `argv[argc]` is not the null terminator, or a slot before it is null.
    MalformedArguments { argc: u64 },
    /// No null terminator inside the view.
    Unterminated(Region),
    /// More entries than the configured scan limit.
    ScanLimitExceeded { region: Region, limit: usize },
    /// A pointer-valued auxiliary entry holds a non-canonical address.
    NonCanonicalAddress { tag: AuxTag, value: u64 },
    /// The kernel flagged the image as something we cannot load.
    HardStop(AuxTag),
    /// A tag required to find the program headers was never seen.
    MissingAuxEntry(AuxTag),
    /// `AT_PHENT` is smaller than an `Elf64_Phdr`.
    ProgramHeaderSize(u64),
    /// `AT_PHNUM * AT_PHENT` does not fit the address space.
    ProgramHeaderTableOverflow { count: u64, entry_size: u64 },
    /// `AT_BASE + p_offset` of the dynamic segment is not a valid address.
    DynamicSegmentOutOfRange { base: u64, offset: u64 },
    /// Nothing to hand control to.
    MissingEntryPoint,
}

impl BootstrapError {
    /// All bootstrap failures are reported the same way to the parent.
    pub const fn exit_code(&self) -> ExitCode {
        ExitCode::UNSUPPORTED_FORMAT
    }
}

impl From<RawAccessError> for BootstrapError {
    fn from(err: RawAccessError) -> Self {
        BootstrapError::Access(err)
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unsupported format: ")?;
        match *self {
            BootstrapError::BadStackPointer(addr) => {
                write!(f, "bad entry stack pointer {:#x}", addr)
            }
            BootstrapError::Access(RawAccessError::OutOfBounds { offset, size, len }) => write!(
                f,
                "read of {} bytes at offset {} past end of {}-byte image",
                size, offset, len
            ),
            BootstrapError::Access(RawAccessError::Overflow) => f.write_str("offset overflow"),
            BootstrapError::Access(RawAccessError::Misaligned { offset, align }) => {
                write!(f, "offset {} not {}-byte aligned", offset, align)
            }
            BootstrapError::MalformedArguments { argc } => {
                write!(f, "argument vector does not hold {} entries", argc)
            }
            BootstrapError::Unterminated(region) => {
                write!(f, "{} has no terminator", region.as_str())
            }
            BootstrapError::ScanLimitExceeded { region, limit } => {
                write!(f, "{} longer than {} entries", region.as_str(), limit)
            }
            BootstrapError::NonCanonicalAddress { tag, value } => {
                write!(f, "{} = {:#x} is not a canonical address", tag.name(), value)
            }
            BootstrapError::HardStop(tag) => write!(f, "{} present", tag.name()),
            BootstrapError::MissingAuxEntry(tag) => write!(f, "{} missing", tag.name()),
            BootstrapError::ProgramHeaderSize(size) => {
                write!(f, "AT_PHENT = {} is smaller than a program header", size)
            }
            BootstrapError::ProgramHeaderTableOverflow { count, entry_size } => write!(
                f,
                "program header table of {} x {} bytes overflows",
                count, entry_size
            ),
            BootstrapError::DynamicSegmentOutOfRange { base, offset } => write!(
                f,
                "dynamic segment at {:#x} + {:#x} is out of range",
                base, offset
            ),
            BootstrapError::MissingEntryPoint => f.write_str("AT_ENTRY missing"),
        }
    }
}
