use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use crate::language::error::{Error, Result};

/// Destination of `print`. Clones write to the same sink.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Output {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// An in-memory sink plus a handle for reading back what was printed.
    pub fn capture() -> (Self, CapturedOutput) {
        let buffer = CapturedOutput::default();
        (Self::new(buffer.clone()), buffer)
    }

    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{}", line)
            .and_then(|_| sink.flush())
            .map_err(|e| Error::runtime(format!("Failed to write output: {}", e)))
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}

#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_lines_are_readable() {
        let (output, captured) = Output::capture();
        output.write_line("first").unwrap();
        output.clone().write_line("second").unwrap();
        assert_eq!(captured.lines(), vec!["first", "second"]);
        assert_eq!(captured.contents(), "first\nsecond\n");
    }
}
