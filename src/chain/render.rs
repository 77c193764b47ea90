//! Terminal rendering of streamed step output.

use std::io::{self, Write};

/// Adds line breaks after sentences and before bullet points.
pub fn format_output(text: &str) -> String {
    text.replace(". ", ".\n").replace("• ", "\n• ")
}

/// Prints a growing buffer incrementally, optionally through [`format_output`].
///
/// Only the part of the formatted text not yet printed is written, so a
/// terminal shows the answer as it streams. A trailing bullet is held back
/// until the next character arrives because formatting may insert a line
/// break in front of it.
#[derive(Debug)]
pub struct StreamPrinter {
    formatted: bool,
    printed: usize,
}

impl StreamPrinter {
    pub fn new(formatted: bool) -> Self {
        Self {
            formatted,
            printed: 0,
        }
    }

    /// Returns the text to print for the current buffer.
    pub fn delta(&mut self, buffer: &str) -> String {
        let rendered = self.render(buffer, false);
        self.take_from(rendered)
    }

    /// Returns whatever is still held back once the buffer is final.
    pub fn finish(&mut self, buffer: &str) -> String {
        let rendered = self.render(buffer, true);
        let rest = self.take_from(rendered);
        self.printed = 0;
        rest
    }

    /// Writes the delta for `buffer` to `out`.
    pub fn write_delta(&mut self, out: &mut impl Write, buffer: &str) -> io::Result<()> {
        let delta = self.delta(buffer);
        out.write_all(delta.as_bytes())?;
        out.flush()
    }

    fn render(&self, buffer: &str, complete: bool) -> String {
        if !self.formatted {
            return buffer.to_string();
        }
        let stable = if complete {
            buffer
        } else {
            buffer.strip_suffix('•').unwrap_or(buffer)
        };
        format_output(stable)
    }

    fn take_from(&mut self, rendered: String) -> String {
        match rendered.get(self.printed..) {
            Some(rest) => {
                let rest = rest.to_string();
                self.printed = rendered.len();
                rest
            }
            None => String::new(),
        }
    }
}
