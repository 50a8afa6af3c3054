//! Raw Linux system calls used before any libc exists

use core::arch::asm;

use crate::abi::{SYS_EXIT, SYS_WRITE};

// ============================================================================
// Raw System Call Functions
// ============================================================================

#[inline]
unsafe fn syscall1(nr: u64, a1: u64) -> u64 {
    let ret: u64;
    asm!(
        "syscall",
        inlateout("rax") nr => ret,
        in("rdi") a1,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack)
    );
    ret
}

#[inline]
unsafe fn syscall3(nr: u64, a1: u64, a2: u64, a3: u64) -> u64 {
    let ret: u64;
    asm!(
        "syscall",
        inlateout("rax") nr => ret,
        in("rdi") a1,
        in("rsi") a2,
        in("rdx") a3,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack)
    );
    ret
}

// ============================================================================
// Wrappers
// ============================================================================

/// Returns bytes written, or a negated errno.
pub unsafe fn write(fd: i32, buf: *const u8, len: usize) -> isize {
    syscall3(SYS_WRITE, fd as u64, buf as u64, len as u64) as isize
}

pub unsafe fn exit(code: i32) -> ! {
    syscall1(SYS_EXIT, code as u64);
    asm!("ud2", options(noreturn));
}
