//! Optional human-readable trace output.
//!
//! Independent of the `log` facade: the trace goes to a caller-supplied
//! writer and is only written when the configured level is positive.

use std::fmt;
use std::io::Write;

use log::warn;

/// Trace sink plus verbosity.
pub struct Trace<'a> {
    sink: Option<&'a mut dyn Write>,
    level: u32,
}

impl<'a> Trace<'a> {
    /// Write to `sink` for messages at or below `level`.
    pub fn new(sink: Option<&'a mut dyn Write>, level: u32) -> Self {
        Self { sink, level }
    }

    /// A trace that never writes.
    pub fn off() -> Self {
        Self {
            sink: None,
            level: 0,
        }
    }

    /// Current verbosity.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether a message at `level` would be written.
    pub fn enabled(&self, level: u32) -> bool {
        level > 0 && self.level >= level && self.sink.is_some()
    }

    /// Write one line at `level`. Write failures are logged and swallowed.
    pub fn line(&mut self, level: u32, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = writeln!(sink, "{}", args) {
                warn!("trace sink write failed: {}", e);
            }
        }
    }
}

impl Default for Trace<'_> {
    fn default() -> Self {
        Self::off()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_respects_level() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut trace = Trace::new(Some(&mut buf), 1);
            trace.line(1, format_args!("try {}", 1));
            trace.line(2, format_args!("pass {}", 3));
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "try 1\n");
    }

    #[test]
    fn test_level_zero_writes_nothing() {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut trace = Trace::new(Some(&mut buf), 0);
            assert!(!trace.enabled(1));
            trace.line(1, format_args!("hidden"));
        }
        assert!(buf.is_empty());

        // No sink with a positive level is fine too.
        let mut trace = Trace::new(None, 3);
        trace.line(1, format_args!("dropped"));
    }
}
