//! Constants shared with the kernel and the ELF64 format

// ============================================================================
// Auxiliary Vector Types
// ============================================================================

pub const AT_NULL: u64 = 0;
pub const AT_IGNORE: u64 = 1;
pub const AT_EXECFD: u64 = 2;
pub const AT_PHDR: u64 = 3;
pub const AT_PHENT: u64 = 4;
pub const AT_PHNUM: u64 = 5;
pub const AT_PAGESZ: u64 = 6;
pub const AT_BASE: u64 = 7;
pub const AT_FLAGS: u64 = 8;
pub const AT_ENTRY: u64 = 9;
pub const AT_NOTELF: u64 = 10;
pub const AT_UID: u64 = 11;
pub const AT_EUID: u64 = 12;
pub const AT_GID: u64 = 13;
pub const AT_EGID: u64 = 14;
pub const AT_PLATFORM: u64 = 15;

/// Number of slots in a dense table indexed by auxiliary tag value.
pub const AUX_TABLE_LEN: usize = AT_PLATFORM as usize + 1;

// ============================================================================
// ELF Program Header Types
// ============================================================================

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;
pub const PT_SHLIB: u32 = 5;
pub const PT_PHDR: u32 = 6;
pub const PT_TLS: u32 = 7;

// ============================================================================
// ELF Program Header Flags
// ============================================================================

pub const PF_X: u32 = 0x1;
pub const PF_W: u32 = 0x2;
pub const PF_R: u32 = 0x4;

// ============================================================================
// System Call Numbers
// ============================================================================

pub const SYS_WRITE: u64 = 1;
pub const SYS_EXIT: u64 = 60;

pub const STDERR_FILENO: i32 = 2;

// ============================================================================
// Layout
// ============================================================================

/// Size of one slot of the initial stack image.
pub const WORD_SIZE: usize = 8;
