//! Human-readable dump of what the bootstrap decoded.
//!
//! Output goes to any [`core::fmt::Write`]; the loader passes
//! [`crate::logger::Stderr`].

use core::ffi::CStr;
use core::fmt::{self, Write};

use crate::auxv::{AuxEntry, AuxTable, AuxTag};
use crate::phdr::ProgramHeaderTable;
use crate::stack::{ProcessContext, StringVector};

pub fn dump_context<W: Write>(out: &mut W, ctx: &ProcessContext<'_>) -> fmt::Result {
    writeln!(out, "process context data dump:")?;

    writeln!(out, "\targc = {}\n\targv contains", ctx.argc())?;
    dump_strings(out, ctx.argv())?;

    writeln!(out, "\tenvc = {}\n\tenvv contains", ctx.envc())?;
    dump_strings(out, ctx.envv())?;

    writeln!(out, "\taux vector contains")?;
    for pair in ctx.auxv().entries() {
        let entry = AuxTag::from_raw(pair.tag).map(|tag| AuxEntry::decode(tag, pair.value));
        match entry {
            Some(Ok(entry)) => writeln!(out, "\t\t{}", entry)?,
            Some(Err(_)) => writeln!(out, "\t\tmalformed entry {} = {:#x}", pair.tag, pair.value)?,
            None => writeln!(out, "\t\tunknown entry")?,
        }
    }
    Ok(())
}

pub fn dump_aux_table<W: Write>(out: &mut W, table: &AuxTable) -> fmt::Result {
    writeln!(out, "aux table contains")?;
    for entry in table.iter() {
        writeln!(out, "\t{}", entry)?;
    }
    Ok(())
}

pub fn dump_program_headers<W: Write>(out: &mut W, table: &ProgramHeaderTable<'_>) -> fmt::Result {
    writeln!(out, "program headers ({}):", table.len())?;
    for phdr in table.iter() {
        writeln!(
            out,
            "\t{:<10} offset={:#x} vaddr={:#x} filesz={:#x} memsz={:#x} flags={:?}",
            phdr.segment_type().name(),
            phdr.p_offset,
            phdr.p_vaddr,
            phdr.p_filesz,
            phdr.p_memsz,
            phdr.flags(),
        )?;
    }
    Ok(())
}

fn dump_strings<W: Write>(out: &mut W, strings: StringVector<'_>) -> fmt::Result {
    for s in strings.iter() {
        writeln!(out, "\t\t'{}'", Escaped(s))?;
    }
    Ok(())
}

/// C string shown byte for byte, non-printable bytes escaped.
struct Escaped<'a>(&'a CStr);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_bytes().escape_ascii())
    }
}
