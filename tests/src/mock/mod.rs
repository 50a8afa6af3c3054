//! Mock implementations for testing
//!
//! Builds the memory a kernel would hand to a new process, and a platform
//! that records how the bootstrap tried to leave instead of leaving.

pub mod stack;

pub use phdrs::{phdr, table_bytes};
pub use platform::{run_bootstrap, MockPlatform, Outcome};
pub use stack::{StackBuilder, SyntheticStack};
