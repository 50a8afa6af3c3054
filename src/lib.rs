//! m1stld - bootstrap stage of a minimal ELF64 dynamic loader
//!
//! This is the first code that runs in a new process image. It:
//! 1. Decodes argc/argv/envp/auxv from the initial stack
//! 2. Classifies the auxiliary vector and rejects images it cannot handle
//! 3. Scans the program headers for PT_DYNAMIC and places it in memory
//! 4. Transfers control to the program's entry point
//!
//! Relocation and symbol resolution start from the located dynamic segment
//! and are not part of this crate yet.

#![no_std]

// ============================================================================
// Logging Macros
// ============================================================================

#[macro_export]
macro_rules! llog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! lfatal {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! lerror {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! lwarn {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! linfo {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ldebug {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ltrace {
    ($($arg:tt)*) => {{
        $crate::llog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}

pub mod abi;
pub mod auxv;
pub mod bootstrap;
pub mod config;
pub mod dump;
pub mod elf;
pub mod error;
pub mod handoff;
pub mod logger;
pub mod phdr;
pub mod raw;
pub mod stack;

#[cfg(target_arch = "x86_64")]
pub mod platform;
#[cfg(target_arch = "x86_64")]
pub mod syscall;
