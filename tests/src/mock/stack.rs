//! Synthetic initial stacks
//!
//! Lays out argc, argv, envp and auxv exactly the way the kernel does, with
//! the strings kept alive next to the words that point at them.

use std::ffi::CString;

use crate::abi::{AT_NULL, WORD_SIZE};
use crate::stack::StackImage;

#[derive(Default)]
pub struct StackBuilder {
    args: Vec<CString>,
    env: Vec<CString>,
    aux: Vec<(u64, u64)>,
    unterminated_aux: bool,
}

impl StackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: &str) -> Self {
        self.args.push(CString::new(value).unwrap());
        self
    }

    pub fn env(mut self, value: &str) -> Self {
        self.env.push(CString::new(value).unwrap());
        self
    }

    pub fn aux(mut self, tag: u64, value: u64) -> Self {
        self.aux.push((tag, value));
        self
    }

    /// Leave out the `(AT_NULL, 0)` pair.
    pub fn without_aux_terminator(mut self) -> Self {
        self.unterminated_aux = true;
        self
    }

    pub fn build(self) -> SyntheticStack {
        let mut words = Vec::new();
        words.push(self.args.len() as u64);
        words.extend(self.args.iter().map(|s| s.as_ptr() as u64));
        words.push(0);
        words.extend(self.env.iter().map(|s| s.as_ptr() as u64));
        words.push(0);
        for &(tag, value) in &self.aux {
            words.push(tag);
            words.push(value);
        }
        if !self.unterminated_aux {
            words.push(AT_NULL);
            words.push(0);
        }

        let mut strings = self.args;
        strings.extend(self.env);
        SyntheticStack { strings, words }
    }
}

/// Stack words plus the strings they point into.
pub struct SyntheticStack {
    #[allow(dead_code)]
    strings: Vec<CString>,
    words: Vec<u64>,
}

impl SyntheticStack {
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    pub fn image(&self) -> StackImage<'_> {
        // SAFETY: every non-null argv/envp word points into self.strings.
        unsafe { StackImage::new(&self.words) }
    }

    /// What the kernel would leave in rsp.
    pub fn as_ptr(&self) -> *const u64 {
        self.words.as_ptr()
    }

    pub fn address_of(&self, index: usize) -> u64 {
        self.as_ptr() as u64 + (index * WORD_SIZE) as u64
    }
}
