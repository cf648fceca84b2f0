//! Line-oriented output sink for plugin messages, debug lines and reports.
//!
//! Internal tracing goes through `tracing`; this sink is what the user of the
//! plugin actually sees.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

/// Writes plugin output one line at a time.
pub struct Logger {
    writer: Box<dyn Write>,
    debug: bool,
}

impl core::fmt::Debug for Logger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Logger").field("debug", &self.debug).finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stderr()
    }
}

impl Logger {
    /// Log to `writer`.
    pub fn new(writer: impl Write + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            debug: false,
        }
    }

    /// Log to standard error.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// Whether debug lines are written.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Turn debug lines on or off.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Write one line.
    pub fn println(&mut self, message: impl core::fmt::Display) {
        writeln!(self.writer, "{message}").ok();
    }

    /// Write one line, only in debug mode.
    pub fn debug(&mut self, message: impl core::fmt::Display) {
        if self.debug {
            self.println(message);
        }
    }

    /// Write a pre-rendered block verbatim, adding a final newline if missing.
    pub fn write_block(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).ok();
        if !text.ends_with('\n') {
            self.writer.write_all(b"\n").ok();
        }
        self.writer.flush().ok();
    }
}

/// Shared in-memory writer, for tests and harnesses.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Rc<RefCell<Vec<u8>>>);

impl LogBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
