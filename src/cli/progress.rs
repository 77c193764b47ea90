//! Terminal rendering of chain events.

use std::io::{self, Write};

use tokio::sync::mpsc;

use crate::chain::{ChainEvent, StreamPrinter};

/// Prints events until the sender side is dropped.
pub async fn print_events(
    mut events: mpsc::UnboundedReceiver<ChainEvent>,
    mut out: impl Write + Send,
    formatted: bool,
) -> io::Result<()> {
    let mut renderer = EventRenderer::new(formatted);
    while let Some(event) = events.recv().await {
        renderer.render(&event, &mut out)?;
    }
    out.flush()
}

/// Turns events into terminal output.
#[derive(Debug)]
pub struct EventRenderer {
    printer: StreamPrinter,
    buffer: String,
}

impl EventRenderer {
    pub fn new(formatted: bool) -> Self {
        Self {
            printer: StreamPrinter::new(formatted),
            buffer: String::new(),
        }
    }

    pub fn render(&mut self, event: &ChainEvent, out: &mut impl Write) -> io::Result<()> {
        match event {
            ChainEvent::StepStarted { step } => {
                self.buffer.clear();
                writeln!(out, "\n{}", step.heading())?;
                writeln!(out, "{}", "-".repeat(step.heading().len()))?;
            }
            ChainEvent::Fragment { buffer, .. } => {
                self.printer.write_delta(out, buffer)?;
                self.buffer.clone_from(buffer);
            }
            ChainEvent::StepCompleted { result } => {
                let rest = self.printer.finish(&result.text);
                writeln!(out, "{}", rest)?;
            }
            ChainEvent::StepFailed { step, error } => {
                let rest = self.printer.finish(&self.buffer);
                writeln!(out, "{}", rest)?;
                writeln!(out, "\n✗ {} step failed: {}", step, error)?;
            }
            ChainEvent::ChainCompleted => {
                writeln!(out, "\n✓ Evaluation complete")?;
            }
            ChainEvent::ChainAborted { reason } => {
                writeln!(out, "✗ Evaluation not started: {}", reason)?;
            }
        }
        out.flush()
    }
}
