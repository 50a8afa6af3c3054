//! m1stld - process entry
//!
//! The kernel jumps to `_start` with rsp pointing at argc. Everything after
//! that lives in the library; this file only owns the symbols a freestanding
//! static binary has to provide itself.

#![no_std]
#![no_main]

use core::arch::naked_asm;

use m1stld::error::ExitCode;
use m1stld::platform::LinuxPlatform;

mod mem;

/// Raw entry point - receives the initial stack from the kernel
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn _start() -> ! {
    naked_asm!(
        "mov rdi, rsp",           // argc slot, handed to ld_main untouched
        "and rsp, -16",
        "xor rbp, rbp",
        "call {ld_main}",
        "ud2",
        ld_main = sym ld_main,
    );
}

#[no_mangle]
unsafe extern "C" fn ld_main(stack_ptr: *const u64) -> ! {
    m1stld::bootstrap::run(stack_ptr, &mut LinuxPlatform)
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    m1stld::lfatal!("{}", info);
    unsafe { m1stld::syscall::exit(ExitCode::ASSERTION.0) }
}
