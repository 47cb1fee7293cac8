//! Console appender implementation

use crate::core::{Appender, ConsoleStream, Encoding, LogEntry, Result};
use std::io::Write;

/// Writes records to stdout or stderr
pub struct ConsoleAppender {
    stream: ConsoleStream,
    encoding: Encoding,
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new(stream: ConsoleStream) -> Self {
        Self {
            stream,
            encoding: Encoding::Text,
            use_colors: true,
        }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn render(&self, entry: &LogEntry) -> String {
        if self.use_colors {
            self.encoding.encode_colored(entry)
        } else {
            self.encoding.encode(entry)
        }
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.render(entry);
        match self.stream {
            ConsoleStream::Stdout => writeln!(std::io::stdout().lock(), "{}", output)?,
            ConsoleStream::Stderr => writeln!(std::io::stderr().lock(), "{}", output)?,
            ConsoleStream::No => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush()?,
            ConsoleStream::Stderr => std::io::stderr().flush()?,
            ConsoleStream::No => {}
        }
        Ok(())
    }

    fn name(&self) -> &str {
        match self.stream {
            ConsoleStream::Stdout => "console:stdout",
            ConsoleStream::Stderr => "console:stderr",
            ConsoleStream::No => "console:no",
        }
    }
}
