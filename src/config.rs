//! Loader configuration
//!
//! Defaults are fixed at build time (`debug_assertions`, the `diagnostics`
//! feature). The only run-time input is the environment the process was
//! started with, read once it has been decoded:
//!
//! - `M1STLD_LOG=<fatal|error|warn|info|debug|trace>`
//! - `M1STLD_DUMP=<never|before|success>`

use crate::logger::LogLevel;
use crate::stack::StringVector;

const LOG_VAR: &[u8] = b"M1STLD_LOG";
const DUMP_VAR: &[u8] = b"M1STLD_DUMP";

/// Upper bounds on how far the decoder and classifier scan for terminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub max_arguments: usize,
    pub max_environment: usize,
    pub max_aux_entries: usize,
}

impl ScanLimits {
    pub const DEFAULT: ScanLimits = ScanLimits {
        max_arguments: 0x10000,
        max_environment: 0x10000,
        max_aux_entries: 256,
    };
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// When the diagnostic dump runs relative to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpPolicy {
    Never,
    /// Dump everything that was decoded, then decide.
    BeforeValidation,
    /// Dump only images that validated.
    OnSuccess,
}

impl DumpPolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("never") || value.eq_ignore_ascii_case("off") {
            Some(DumpPolicy::Never)
        } else if value.eq_ignore_ascii_case("before") || value.eq_ignore_ascii_case("always") {
            Some(DumpPolicy::BeforeValidation)
        } else if value.eq_ignore_ascii_case("success") {
            Some(DumpPolicy::OnSuccess)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub log_level: LogLevel,
    pub dump: DumpPolicy,
    pub limits: ScanLimits,
}

impl BootstrapConfig {
    pub const fn defaults() -> Self {
        Self {
            log_level: if cfg!(debug_assertions) {
                LogLevel::DEBUG
            } else {
                LogLevel::WARN
            },
            dump: if cfg!(all(feature = "diagnostics", debug_assertions)) {
                DumpPolicy::BeforeValidation
            } else {
                DumpPolicy::Never
            },
            limits: ScanLimits::DEFAULT,
        }
    }

    /// Defaults overridden by `M1STLD_*` variables. Later assignments win;
    /// unparseable values are ignored.
    pub fn from_env(envv: StringVector<'_>) -> Self {
        let mut config = Self::defaults();
        for var in envv.iter() {
            let bytes = var.to_bytes();
            if let Some(eq) = bytes.iter().position(|&b| b == b'=') {
                config.apply(&bytes[..eq], &bytes[eq + 1..]);
            }
        }
        config
    }

    fn apply(&mut self, key: &[u8], value: &[u8]) {
        let Ok(value) = core::str::from_utf8(value) else {
            return;
        };
        if key == LOG_VAR {
            if let Some(level) = LogLevel::from_str(value) {
                self.log_level = level;
            }
        } else if key == DUMP_VAR {
            if let Some(policy) = DumpPolicy::from_str(value) {
                self.dump = policy;
            }
        }
        if !cfg!(feature = "diagnostics") {
            self.dump = DumpPolicy::Never;
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
