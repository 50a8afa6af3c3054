//! Linux x86_64 implementation of the handoff boundary

use core::arch::asm;

use crate::error::ExitCode;
use crate::handoff::{Handoff, Platform};
use crate::syscall;

pub struct LinuxPlatform;

impl Platform for LinuxPlatform {
    fn enter(&mut self, handoff: &Handoff<'_>) -> ! {
        unsafe { jump_to_entry(handoff.entry.addr().as_u64(), handoff.stack.as_u64()) }
    }

    fn terminate(&mut self, code: ExitCode) -> ! {
        unsafe { syscall::exit(code.0) }
    }
}

/// Restore the kernel's stack pointer and jump to `entry` with the register
/// state a freshly exec'd program expects (rdx = 0: no exit handler to
/// register).
#[inline(never)]
unsafe fn jump_to_entry(entry: u64, stack: u64) -> ! {
    asm!(
        // r14/r15 hold the inputs and are left alone below.
        "mov rsp, r15",
        "xor rbp, rbp",
        "xor rax, rax",
        "xor rbx, rbx",
        "xor rcx, rcx",
        "xor rdx, rdx",
        "xor rsi, rsi",
        "xor rdi, rdi",
        "xor r8, r8",
        "xor r9, r9",
        "xor r10, r10",
        "xor r11, r11",
        "xor r12, r12",
        "xor r13, r13",
        "jmp r14",
        in("r14") entry,
        in("r15") stack,
        options(noreturn)
    );
}
