//! decode -> classify -> locate -> hand off

use core::fmt::Write;

use crate::auxv::{self, AuxTable, ExecutableInfo};
use crate::config::{BootstrapConfig, DumpPolicy};
use crate::dump;
use crate::error::BootstrapError;
use crate::handoff::{Handoff, Platform};
use crate::logger::{self, Stderr};
use crate::phdr::{locate_dynamic, ProgramHeaderTable};
use crate::stack::{ProcessContext, StackImage};

/// A decoded and validated process image, ready for locating its segments.
pub struct Bootstrap<'a> {
    pub context: ProcessContext<'a>,
    pub table: AuxTable,
    pub info: ExecutableInfo,
    pub config: BootstrapConfig,
}

/// Decode the stack image and classify its auxiliary vector.
///
/// The run-time configuration comes from the decoded environment, so it takes
/// effect (log level included) from this point on. Depending on the dump
/// policy, the decoded state is written to `diag` before validation or only
/// after it succeeded.
pub fn classify<'a, W: Write>(
    image: StackImage<'a>,
    diag: &mut W,
) -> Result<Bootstrap<'a>, BootstrapError> {
    let context = ProcessContext::decode(image)?;
    let config = BootstrapConfig::from_env(context.envv());
    logger::set_max_level(config.log_level);

    crate::ldebug!(
        "m1stld started: argc={} envc={} auxv at {:#x}",
        context.argc(),
        context.envc(),
        context.auxv_address().as_u64()
    );

    if config.dump == DumpPolicy::BeforeValidation {
        let _ = dump::dump_context(diag, &context);
    }

    let table = AuxTable::scan(&context.auxv(), config.limits.max_aux_entries)?;

    if config.dump == DumpPolicy::BeforeValidation {
        let _ = dump::dump_aux_table(diag, &table);
    }

    let info = table.validate()?;

    if config.dump == DumpPolicy::OnSuccess {
        let _ = dump::dump_context(diag, &context);
        let _ = dump::dump_aux_table(diag, &table);
    }

    crate::ltrace!(
        "phdr={:#x} phent={} phnum={} base={:#x} pagesz={}",
        info.program_headers.as_u64(),
        info.program_header_size,
        info.program_header_count,
        info.base.as_u64(),
        info.page_size
    );

    Ok(Bootstrap {
        context,
        table,
        info,
        config,
    })
}

impl<'a> Bootstrap<'a> {
    /// Locate the dynamic segment in `phdrs` and assemble the handoff.
    pub fn handoff(&self, phdrs: &ProgramHeaderTable<'_>) -> Result<Handoff<'a>, BootstrapError> {
        let dynamic = locate_dynamic(phdrs, self.info.base)?;
        match dynamic {
            Some(segment) => crate::linfo!(
                "dynamic segment at {:#x} (offset {:#x})",
                segment.address().as_u64(),
                segment.header().p_offset
            ),
            None => crate::ldebug!("no PT_DYNAMIC, nothing to link"),
        }

        let entry = self.info.entry.ok_or(BootstrapError::MissingEntryPoint)?;

        Ok(Handoff {
            entry,
            stack: self.context.base(),
            dynamic,
            context: self.context,
        })
    }
}

/// Process entry: never returns.
///
/// # Safety
///
/// `stack` must be the untouched stack pointer the kernel handed to the
/// process entry point.
pub unsafe fn run<P: Platform>(stack: *const u64, platform: &mut P) -> ! {
    match prepare(stack) {
        Ok(handoff) => {
            crate::ldebug!("entering program at {}", handoff.entry);
            platform.enter(&handoff)
        }
        Err(err) => {
            crate::lerror!("{}", err);
            platform.terminate(err.exit_code())
        }
    }
}

unsafe fn prepare(stack: *const u64) -> Result<Handoff<'static>, BootstrapError> {
    let limits = BootstrapConfig::defaults().limits;
    let image = StackImage::from_raw(stack, &limits)?;
    let bootstrap = classify(image, &mut Stderr)?;

    let phdrs = ProgramHeaderTable::from_info(&bootstrap.info)?;
    if bootstrap.config.dump != DumpPolicy::Never {
        let _ = dump::dump_program_headers(&mut Stderr, &phdrs);
    }

    let handoff = bootstrap.handoff(&phdrs)?;
    auxv::publish(bootstrap.table);
    Ok(handoff)
}
