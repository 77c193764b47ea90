//! Command-line interface for canvas-forge.
//!
//! Provides commands for running the evaluation chain, key validation,
//! canvas inspection, export and log viewing.

mod collect;
mod commands;
mod progress;

pub use collect::{collect_canvas, prompt_blank_fields, read_answer, CanvasArgs};
pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, ExportMode};
pub use progress::{print_events, EventRenderer};
