//! The point where the loader stops and someone else takes over.
//!
//! Both ways out of the bootstrap (jumping to the program, or giving up) go
//! through [`Platform`], so nothing in the parsing code ever performs a
//! non-returning operation itself.

use x86_64::VirtAddr;

use crate::auxv::EntryPoint;
use crate::error::ExitCode;
use crate::phdr::DynamicSegment;
use crate::stack::ProcessContext;

/// Everything the program needs to be started.
#[derive(Clone, Copy)]
pub struct Handoff<'a> {
    pub entry: EntryPoint,
    /// Stack pointer to restore before jumping: the argc slot.
    pub stack: VirtAddr,
    pub dynamic: Option<DynamicSegment>,
    pub context: ProcessContext<'a>,
}

pub trait Platform {
    /// Transfer control to `handoff.entry` on the stack the kernel built.
    fn enter(&mut self, handoff: &Handoff<'_>) -> !;

    /// End the process with `code`.
    fn terminate(&mut self, code: ExitCode) -> !;
}
