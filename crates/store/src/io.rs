use std::sync::{Mutex, PoisonError};

/// Channel for diagnostics addressed to the person running the package manager.
pub trait OperatorIo: Send + Sync {
    fn write_error(&self, message: &str);
}

/// Writes diagnostics to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleIo;

impl OperatorIo for ConsoleIo {
    fn write_error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct BufferIo {
    lines: Mutex<Vec<String>>,
}

impl BufferIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OperatorIo for BufferIo {
    fn write_error(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
