//! Initial stack decoding
//!
//! At process entry the kernel leaves this layout at the stack pointer, one
//! 64-bit word per slot:
//!
//! ```text
//! base -> argc
//!         argv[0] .. argv[argc - 1]
//!         NULL
//!         envp[0] .. envp[envc - 1]
//!         NULL
//!         auxv: (tag, value) pairs .. (AT_NULL, _)
//! ```
//!
//! [`StackImage`] is a bounded read-only view over that region and
//! [`ProcessContext`] is the typed result of decoding it. Strings are never
//! copied; they alias the kernel-provided memory for the process lifetime.

use core::ffi::{c_char, CStr};
use core::slice;

use x86_64::VirtAddr;

use crate::abi::{AT_NULL, WORD_SIZE};
use crate::config::ScanLimits;
use crate::error::{BootstrapError, Region};
use crate::raw::{RawAccessError, RawReader};

const ARGC_SLOT: usize = 0;
const ARGV_SLOT: usize = 1;

/// Bounded view over the initial stack image.
#[derive(Clone, Copy)]
pub struct StackImage<'a> {
    reader: RawReader<'a>,
}

impl<'a> StackImage<'a> {
    /// Wrap an already-bounded word slice.
    ///
    /// # Safety
    ///
    /// Every non-null word that decodes as an `argv` or `envp` slot must point
    /// to a NUL-terminated string that lives at least as long as `'a`.
    pub unsafe fn new(words: &'a [u64]) -> Self {
        Self {
            reader: RawReader::from_words(words),
        }
    }

    /// Measure the layout the kernel left at `base` and return a view that
    /// covers exactly argc, both vectors and the auxiliary vector including
    /// its `AT_NULL` pair.
    ///
    /// Each region is scanned for at most the number of entries `limits`
    /// allows; running past a limit is reported instead of read further.
    ///
    /// # Safety
    ///
    /// `base` must be the stack pointer handed over by the kernel at process
    /// entry, before anything was pushed.
    pub unsafe fn from_raw(
        base: *const u64,
        limits: &ScanLimits,
    ) -> Result<StackImage<'static>, BootstrapError> {
        let addr = base as u64;
        if base.is_null() || addr % WORD_SIZE as u64 != 0 {
            return Err(BootstrapError::BadStackPointer(addr));
        }

        let argc = *base.add(ARGC_SLOT);
        if argc > limits.max_arguments as u64 {
            return Err(BootstrapError::ScanLimitExceeded {
                region: Region::Arguments,
                limit: limits.max_arguments,
            });
        }

        // argc, argv slots, argv terminator
        let mut len = ARGV_SLOT + argc as usize + 1;

        let mut envc = 0usize;
        while *base.add(len) != 0 {
            envc += 1;
            if envc > limits.max_environment {
                return Err(BootstrapError::ScanLimitExceeded {
                    region: Region::Environment,
                    limit: limits.max_environment,
                });
            }
            len += 1;
        }
        len += 1;

        let mut entries = 0usize;
        loop {
            let tag = *base.add(len);
            len += 2;
            if tag == AT_NULL {
                break;
            }
            entries += 1;
            if entries > limits.max_aux_entries {
                return Err(BootstrapError::ScanLimitExceeded {
                    region: Region::AuxiliaryVector,
                    limit: limits.max_aux_entries,
                });
            }
        }

        Ok(StackImage::new(slice::from_raw_parts(base, len)))
    }

    /// Address of the argc slot.
    pub fn base(&self) -> VirtAddr {
        VirtAddr::new_truncate(self.reader.base_addr())
    }

    /// Number of words covered by the view.
    pub fn word_count(&self) -> usize {
        self.reader.len() / WORD_SIZE
    }

    fn word(&self, index: usize) -> Result<u64, RawAccessError> {
        let offset = index
            .checked_mul(WORD_SIZE)
            .ok_or(RawAccessError::Overflow)?;
        self.reader.u64(offset)
    }

    fn words(&self, index: usize, count: usize) -> Result<&'a [u64], RawAccessError> {
        let offset = index
            .checked_mul(WORD_SIZE)
            .ok_or(RawAccessError::Overflow)?;
        self.reader.slice::<u64>(offset, count)
    }

    /// Every word from `index` to the end of the view.
    fn words_from(&self, index: usize) -> Result<&'a [u64], RawAccessError> {
        let total = self.word_count();
        if index > total {
            return Err(RawAccessError::OutOfBounds {
                offset: index.saturating_mul(WORD_SIZE),
                size: 0,
                len: self.reader.len(),
            });
        }
        self.words(index, total - index)
    }

    fn argc(&self) -> Result<u64, BootstrapError> {
        Ok(self.word(ARGC_SLOT)?)
    }

    /// The `argc` argument slots; `argv[argc]` must be the terminator.
    fn arguments(&self, argc: u64) -> Result<&'a [u64], BootstrapError> {
        let count = usize::try_from(argc).map_err(|_| RawAccessError::Overflow)?;
        let slots = self.words(ARGV_SLOT, count)?;
        let terminator = self.word(ARGV_SLOT + count)?;
        if terminator != 0 || slots.iter().any(|&slot| slot == 0) {
            return Err(BootstrapError::MalformedArguments { argc });
        }
        Ok(slots)
    }

    /// Environment slots starting at `index`, up to (not including) the null.
    fn environment(&self, index: usize) -> Result<&'a [u64], BootstrapError> {
        let rest = self.words_from(index)?;
        let envc = rest
            .iter()
            .position(|&slot| slot == 0)
            .ok_or(BootstrapError::Unterminated(Region::Environment))?;
        Ok(&rest[..envc])
    }

    fn auxiliary(&self, index: usize) -> Result<&'a [u64], BootstrapError> {
        Ok(self.words_from(index)?)
    }
}

/// Decoded process startup information.
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    base: VirtAddr,
    argc: u64,
    argv: StringVector<'a>,
    envv: StringVector<'a>,
    auxv: AuxVector<'a>,
}

impl<'a> ProcessContext<'a> {
    pub fn decode(image: StackImage<'a>) -> Result<Self, BootstrapError> {
        let argc = image.argc()?;
        let argv = image.arguments(argc)?;

        let env_index = ARGV_SLOT + argv.len() + 1;
        let envv = image.environment(env_index)?;

        let aux_index = env_index + envv.len() + 1;
        let auxv = image.auxiliary(aux_index)?;

        Ok(Self {
            base: image.base(),
            argc,
            argv: StringVector { slots: argv },
            envv: StringVector { slots: envv },
            auxv: AuxVector::new(auxv),
        })
    }

    pub fn base(&self) -> VirtAddr {
        self.base
    }

    pub fn argc(&self) -> u64 {
        self.argc
    }

    pub fn argv(&self) -> StringVector<'a> {
        self.argv
    }

    /// Counted while decoding; the layout does not store it.
    pub fn envc(&self) -> u64 {
        self.envv.len() as u64
    }

    pub fn envv(&self) -> StringVector<'a> {
        self.envv
    }

    pub fn auxv(&self) -> AuxVector<'a> {
        self.auxv
    }

    /// Address of the first auxiliary vector pair.
    pub fn auxv_address(&self) -> VirtAddr {
        self.auxv.address()
    }
}

/// Null-terminated vector of C strings, terminator excluded.
#[derive(Clone, Copy)]
pub struct StringVector<'a> {
    slots: &'a [u64],
}

impl<'a> StringVector<'a> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a CStr> {
        let ptr = *self.slots.get(index)? as *const c_char;
        // SAFETY: slots are non-null by construction, and the StackImage
        // constructors require them to be C strings that outlive 'a.
        Some(unsafe { CStr::from_ptr(ptr) })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CStr> + 'a {
        let vector = *self;
        (0..vector.len()).filter_map(move |index| vector.get(index))
    }

    /// Raw `char **` for handing on to C-style consumers.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.slots.as_ptr() as *const *const c_char
    }
}

/// One raw `(tag, value)` pair as the kernel wrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAuxv {
    pub tag: u64,
    pub value: u64,
}

/// Words from the start of the auxiliary vector to the end of the view.
#[derive(Clone, Copy)]
pub struct AuxVector<'a> {
    words: &'a [u64],
}

impl<'a> AuxVector<'a> {
    /// Values are never dereferenced here, so any word slice will do.
    pub fn new(words: &'a [u64]) -> Self {
        Self { words }
    }

    pub fn address(&self) -> VirtAddr {
        VirtAddr::new_truncate(self.words.as_ptr() as u64)
    }

    /// Every complete pair in the view, terminator and anything after it
    /// included.
    pub fn raw_pairs(&self) -> impl Iterator<Item = RawAuxv> + 'a {
        self.words.chunks_exact(2).map(|pair| RawAuxv {
            tag: pair[0],
            value: pair[1],
        })
    }

    /// Pairs before the `AT_NULL` terminator.
    pub fn entries(&self) -> impl Iterator<Item = RawAuxv> + 'a {
        self.raw_pairs().take_while(|pair| pair.tag != AT_NULL)
    }
}
