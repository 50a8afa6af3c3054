//! Diagnostic Dump Tests

use crate::abi::*;
use crate::auxv::AuxTable;
use crate::dump::{dump_aux_table, dump_context, dump_program_headers};
use crate::elf::PHDR_SIZE;
use crate::mock::{phdr, table_bytes, StackBuilder};
use crate::phdr::ProgramHeaderTable;
use crate::stack::ProcessContext;

#[test]
fn test_dump_context_layout() {
    let stack = StackBuilder::new()
        .arg("prog")
        .arg("--flag")
        .env("KEY=VALUE")
        .aux(AT_PAGESZ, 4096)
        .aux(AT_PHDR, 0x1000)
        .build();
    let ctx = ProcessContext::decode(stack.image()).unwrap();

    let mut out = String::new();
    dump_context(&mut out, &ctx).unwrap();

    assert_eq!(
        out,
        "process context data dump:\n\
         \targc = 2\n\
         \targv contains\n\
         \t\t'prog'\n\
         \t\t'--flag'\n\
         \tenvc = 1\n\
         \tenvv contains\n\
         \t\t'KEY=VALUE'\n\
         \taux vector contains\n\
         \t\tAT_PAGESZ = 4096\n\
         \t\tAT_PHDR = 0x1000\n"
    );
}

#[test]
fn test_dump_context_marks_unknown_and_malformed() {
    let stack = StackBuilder::new()
        .aux(AT_BASE, 0xdead_0000_0000_0000)
        .aux(33, 0x7fff_0000)
        .build();
    let ctx = ProcessContext::decode(stack.image()).unwrap();

    let mut out = String::new();
    dump_context(&mut out, &ctx).unwrap();

    assert!(out.contains("\t\tmalformed entry 7 = 0xdead000000000000\n"));
    assert!(out.contains("\t\tunknown entry\n"));
}

#[test]
fn test_dump_escapes_control_bytes() {
    let stack = StackBuilder::new().arg("a\tb").build();
    let ctx = ProcessContext::decode(stack.image()).unwrap();

    let mut out = String::new();
    dump_context(&mut out, &ctx).unwrap();
    assert!(out.contains("\t\t'a\\tb'\n"));
}

#[test]
fn test_dump_aux_table() {
    let words = [AT_ENTRY, 0x401020, AT_PAGESZ, 4096, AT_NULL, 0];
    let table = AuxTable::scan(&crate::stack::AuxVector::new(&words), 256).unwrap();

    let mut out = String::new();
    dump_aux_table(&mut out, &table).unwrap();
    assert_eq!(
        out,
        "aux table contains\n\tAT_PAGESZ = 4096\n\tAT_ENTRY = 0x401020\n"
    );
}

#[test]
fn test_dump_program_headers() {
    let mut dynamic = phdr(PT_DYNAMIC, 0x2000);
    dynamic.p_flags = PF_R | PF_W;
    let bytes = table_bytes(&[phdr(PT_LOAD, 0), dynamic], PHDR_SIZE);
    let table = ProgramHeaderTable::new(&bytes, 2, PHDR_SIZE as u64).unwrap();

    let mut out = String::new();
    dump_program_headers(&mut out, &table).unwrap();

    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "program headers (2):");
    assert!(lines[1].starts_with("\tPT_LOAD "));
    assert!(lines[2].starts_with("\tPT_DYNAMIC "));
    assert!(lines[2].contains("offset=0x2000"));
}
