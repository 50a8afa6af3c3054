//! Bootstrap Pipeline Tests
//!
//! `classify` applies the decoded environment to the process-wide log level,
//! so everything here runs serially.

use serial_test::serial;
use x86_64::VirtAddr;

use crate::abi::*;
use crate::auxv::{self, AuxTag, EntryPoint};
use crate::bootstrap::classify;
use crate::elf::PHDR_SIZE;
use crate::error::{BootstrapError, ExitCode};
use crate::logger::{self, LogLevel};
use crate::mock::{phdr, run_bootstrap, table_bytes, Outcome, StackBuilder};
use crate::phdr::ProgramHeaderTable;
use crate::syscall::take_stderr;

fn program_headers(with_dynamic: bool) -> Vec<u8> {
    let mut headers = vec![
        phdr(PT_PHDR, 0x40),
        phdr(PT_INTERP, 0x2a8),
        phdr(PT_LOAD, 0),
        phdr(PT_LOAD, 0x1000),
        phdr(PT_NOTE, 0x2c4),
        phdr(PT_TLS, 0x1f00),
    ];
    if with_dynamic {
        headers.insert(4, phdr(PT_DYNAMIC, 0x2000));
    }
    table_bytes(&headers, PHDR_SIZE)
}

/// The process image a kernel hands to a small dynamically linked program.
fn process(phdr_addr: u64, phnum: u64) -> StackBuilder {
    StackBuilder::new()
        .arg("prog")
        .arg("--flag")
        .env("KEY=VALUE")
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, phdr_addr)
        .aux(AT_PHENT, 56)
        .aux(AT_PHNUM, phnum)
        .aux(AT_BASE, 0x400000)
        .aux(AT_ENTRY, 0x401020)
}

// =========================================================================
// Classification
// =========================================================================

#[test]
#[serial]
fn test_classify_typical_process() {
    let stack = process(0x1000, 7).env("M1STLD_DUMP=never").build();
    let mut diag = String::new();

    let boot = classify(stack.image(), &mut diag).unwrap();

    assert_eq!(boot.context.argc(), 2);
    assert_eq!(boot.context.envc(), 2);
    assert_eq!(boot.info.page_size, 4096);
    assert_eq!(boot.info.program_headers, VirtAddr::new(0x1000));
    assert_eq!(boot.info.program_header_size, 56);
    assert_eq!(boot.info.program_header_count, 7);
    assert_eq!(boot.info.base, VirtAddr::new(0x400000));
    assert_eq!(
        boot.info.entry,
        Some(EntryPoint::new(VirtAddr::new(0x401020)))
    );
    assert_eq!(boot.table.len(), 6);
    assert!(diag.is_empty());
}

#[test]
#[serial]
fn test_classify_applies_log_level() {
    let saved = logger::max_level();
    let stack = process(0x1000, 7).env("M1STLD_LOG=trace").build();

    classify(stack.image(), &mut String::new()).unwrap();
    assert_eq!(logger::max_level(), LogLevel::TRACE);
    assert!(take_stderr().contains("[m1stld] DEBUG: m1stld started: argc=2 envc=2"));

    logger::set_max_level(saved);
}

#[test]
#[serial]
fn test_classify_rejects_missing_tags() {
    let stack = StackBuilder::new()
        .arg("prog")
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, 0x1000)
        .aux(AT_PHNUM, 7)
        .build();

    let result = classify(stack.image(), &mut String::new());
    assert_eq!(
        result.err().map(|e| e.to_string()),
        Some("unsupported format: AT_PHENT missing".to_owned())
    );
}

#[test]
#[serial]
fn test_classify_rejects_hard_stop() {
    let stack = process(0x1000, 7).aux(AT_EXECFD, 3).build();
    let result = classify(stack.image(), &mut String::new());
    assert_eq!(result.err(), Some(BootstrapError::HardStop(AuxTag::ExecFd)));
}

#[test]
#[serial]
fn test_classify_rejects_unterminated_aux() {
    let stack = process(0x1000, 7).without_aux_terminator().build();
    let result = classify(stack.image(), &mut String::new());
    assert!(matches!(result, Err(BootstrapError::Unterminated(_))));
}

// =========================================================================
// Dump Policy
// =========================================================================

#[cfg(feature = "diagnostics")]
#[test]
#[serial]
fn test_dump_before_validation_shows_rejected_image() {
    let stack = StackBuilder::new()
        .arg("prog")
        .env("M1STLD_DUMP=before")
        .aux(AT_NOTELF, 1)
        .build();
    let mut diag = String::new();

    assert!(classify(stack.image(), &mut diag).is_err());
    assert!(diag.starts_with("process context data dump:\n"));
    assert!(diag.contains("\t\t'prog'\n"));
    assert!(diag.contains("aux table contains\n\tAT_NOTELF = 1\n"));
}

#[cfg(feature = "diagnostics")]
#[test]
#[serial]
fn test_dump_on_success_skips_rejected_image() {
    let stack = StackBuilder::new()
        .arg("prog")
        .env("M1STLD_DUMP=success")
        .aux(AT_NOTELF, 1)
        .build();
    let mut diag = String::new();

    assert!(classify(stack.image(), &mut diag).is_err());
    assert!(diag.is_empty());
}

#[cfg(feature = "diagnostics")]
#[test]
#[serial]
fn test_dump_on_success_shows_accepted_image() {
    let stack = process(0x1000, 7).env("M1STLD_DUMP=success").build();
    let mut diag = String::new();

    classify(stack.image(), &mut diag).unwrap();
    assert!(diag.contains("\targc = 2\n"));
    assert!(diag.contains("\tAT_ENTRY = 0x401020\n"));
}

// =========================================================================
// Handoff
// =========================================================================

#[test]
#[serial]
fn test_handoff_locates_dynamic_segment() {
    let stack = process(0x1000, 7).env("M1STLD_DUMP=never").build();
    let boot = classify(stack.image(), &mut String::new()).unwrap();
    let bytes = program_headers(true);
    let phdrs = ProgramHeaderTable::new(&bytes, 7, 56).unwrap();

    let handoff = boot.handoff(&phdrs).unwrap();

    assert_eq!(handoff.entry.addr().as_u64(), 0x401020);
    assert_eq!(handoff.stack.as_u64(), stack.as_ptr() as u64);
    assert_eq!(
        handoff.dynamic.map(|d| d.address().as_u64()),
        Some(0x402000)
    );
    assert_eq!(handoff.context.argc(), 2);
}

#[test]
#[serial]
fn test_handoff_static_image() {
    let stack = process(0x1000, 6).env("M1STLD_DUMP=never").build();
    let boot = classify(stack.image(), &mut String::new()).unwrap();
    let bytes = program_headers(false);
    let phdrs = ProgramHeaderTable::new(&bytes, 6, 56).unwrap();

    let handoff = boot.handoff(&phdrs).unwrap();
    assert!(handoff.dynamic.is_none());
}

#[test]
#[serial]
fn test_handoff_requires_entry() {
    let stack = StackBuilder::new()
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, 0x1000)
        .aux(AT_PHENT, 56)
        .aux(AT_PHNUM, 0)
        .build();
    let boot = classify(stack.image(), &mut String::new()).unwrap();
    let phdrs = ProgramHeaderTable::new(&[], 0, 56).unwrap();

    assert_eq!(
        boot.handoff(&phdrs).err(),
        Some(BootstrapError::MissingEntryPoint)
    );
}

// =========================================================================
// End to End
// =========================================================================

#[test]
#[serial]
fn test_run_enters_program() {
    let bytes = program_headers(true);
    let stack = process(bytes.as_ptr() as u64, 7)
        .env("M1STLD_LOG=info")
        .env("M1STLD_DUMP=never")
        .build();
    take_stderr();

    let outcome = unsafe { run_bootstrap(stack.as_ptr()) };

    assert_eq!(
        outcome,
        Outcome::Entered {
            entry: 0x401020,
            stack: stack.as_ptr() as u64,
            dynamic: Some(0x402000),
            argc: 2,
        }
    );
    assert!(take_stderr().contains("[m1stld] INFO: dynamic segment at 0x402000 (offset 0x2000)\n"));

    // Whatever run published first is what later stages see.
    assert!(auxv::published().is_some());
    assert!(auxv::lookup(AuxTag::PageSize).is_some());
}

#[test]
#[serial]
fn test_run_enters_static_program() {
    let bytes = program_headers(false);
    let stack = process(bytes.as_ptr() as u64, 6).build();

    let outcome = unsafe { run_bootstrap(stack.as_ptr()) };
    assert!(matches!(
        outcome,
        Outcome::Entered {
            dynamic: None,
            entry: 0x401020,
            ..
        }
    ));
}

#[test]
#[serial]
fn test_run_rejects_before_touching_program_headers() {
    // AT_PHDR points at unmapped memory; reading it would fault.
    let stack = StackBuilder::new()
        .arg("prog")
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, 0x1000)
        .aux(AT_PHNUM, 7)
        .aux(AT_ENTRY, 0x401020)
        .build();
    take_stderr();

    let outcome = unsafe { run_bootstrap(stack.as_ptr()) };

    assert_eq!(outcome, Outcome::Terminated(ExitCode::UNSUPPORTED_FORMAT));
    assert!(take_stderr().contains("[m1stld] ERROR: unsupported format: AT_PHENT missing\n"));
}

#[test]
#[serial]
fn test_run_rejects_hard_stop() {
    let bytes = program_headers(true);
    let stack = process(bytes.as_ptr() as u64, 7).aux(AT_NOTELF, 1).build();

    let outcome = unsafe { run_bootstrap(stack.as_ptr()) };
    assert_eq!(outcome, Outcome::Terminated(ExitCode(1)));
}

#[test]
#[serial]
fn test_run_rejects_null_stack() {
    let outcome = unsafe { run_bootstrap(core::ptr::null()) };
    assert_eq!(outcome, Outcome::Terminated(ExitCode::UNSUPPORTED_FORMAT));
}

#[test]
#[serial]
fn test_run_rejects_missing_entry() {
    let bytes = program_headers(true);
    let stack = StackBuilder::new()
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, bytes.as_ptr() as u64)
        .aux(AT_PHENT, 56)
        .aux(AT_PHNUM, 7)
        .build();

    let outcome = unsafe { run_bootstrap(stack.as_ptr()) };
    assert_eq!(outcome, Outcome::Terminated(ExitCode::UNSUPPORTED_FORMAT));
}
