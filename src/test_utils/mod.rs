//! Shared test utilities for repogen.

pub mod fixtures;

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// In-memory writer that can be handed to a reporter and read back later.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// True when `text` contains an ANSI escape sequence.
pub fn contains_ansi(text: &str) -> bool {
    text.contains('\u{1b}')
}
