//! Levelled logging to stderr
//!
//! There is no allocator and no buffered stdio this early, so every line is
//! formatted into a fixed stack buffer and handed to `write(2)` in one go.

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU8, Ordering};

use crate::abi::STDERR_FILENO;
use crate::syscall;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::WARN.priority());

const LINE_PREFIX: &str = "[m1stld]";
const LINE_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    FATAL,
    ERROR,
    WARN,
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::FATAL => "FATAL",
            LogLevel::ERROR => "ERROR",
            LogLevel::WARN => "WARN",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::TRACE => "TRACE",
        }
    }

    pub const fn priority(self) -> u8 {
        match self {
            LogLevel::FATAL => 0,
            LogLevel::ERROR => 1,
            LogLevel::WARN => 2,
            LogLevel::INFO => 3,
            LogLevel::DEBUG => 4,
            LogLevel::TRACE => 5,
        }
    }

    fn from_priority(value: u8) -> Self {
        match value {
            0 => LogLevel::FATAL,
            1 => LogLevel::ERROR,
            2 => LogLevel::WARN,
            3 => LogLevel::INFO,
            4 => LogLevel::DEBUG,
            _ => LogLevel::TRACE,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("fatal") {
            Some(LogLevel::FATAL)
        } else if value.eq_ignore_ascii_case("error") {
            Some(LogLevel::ERROR)
        } else if value.eq_ignore_ascii_case("warn") || value.eq_ignore_ascii_case("warning") {
            Some(LogLevel::WARN)
        } else if value.eq_ignore_ascii_case("info") {
            Some(LogLevel::INFO)
        } else if value.eq_ignore_ascii_case("debug") {
            Some(LogLevel::DEBUG)
        } else if value.eq_ignore_ascii_case("trace") {
            Some(LogLevel::TRACE)
        } else {
            None
        }
    }
}

pub fn set_max_level(level: LogLevel) {
    LOG_LEVEL.store(level.priority(), Ordering::Relaxed);
}

pub fn max_level() -> LogLevel {
    LogLevel::from_priority(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: LogLevel) -> bool {
    level.priority() <= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }

    let mut line = LineBuffer::new();
    let _ = write!(line, "{} {}: ", LINE_PREFIX, LevelDisplay(level));
    // Overlong messages are cut rather than dropped.
    let _ = fmt::write(&mut line, args);
    line.finish();
    let _ = Stderr.write_str(line.as_str());
}

/// Unbuffered writer for file descriptor 2.
pub struct Stderr;

impl Write for Stderr {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut rest = s.as_bytes();
        while !rest.is_empty() {
            let written = unsafe { syscall::write(STDERR_FILENO, rest.as_ptr(), rest.len()) };
            if written <= 0 {
                return Err(fmt::Error);
            }
            rest = &rest[written as usize..];
        }
        Ok(())
    }
}

struct LevelDisplay(LogLevel);

impl fmt::Display for LevelDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    const fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    /// One byte is always kept free for the newline.
    fn finish(&mut self) {
        self.buf[self.len] = b'\n';
        self.len += 1;
    }

    fn as_str(&self) -> &str {
        // Only whole `&str` pieces or char-boundary cuts are ever copied in.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("<log line lost>\n")
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_CAPACITY - 1 - self.len;
        if s.len() <= room {
            self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
            self.len += s.len();
            return Ok(());
        }
        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf[self.len..self.len + cut].copy_from_slice(&s.as_bytes()[..cut]);
        self.len += cut;
        Err(fmt::Error)
    }
}
