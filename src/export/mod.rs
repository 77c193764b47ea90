//! Export of canvas data and chain results.
//!
//! Two artifacts are produced:
//! - `business_plan_<stamp>.json`: the canvas fields as pretty JSON
//! - `business_plan_<stamp>.txt`: the JSON followed by the three analyses

mod canvas;
pub mod report;

pub use canvas::{CanvasExporter, ExportPaths, DEFAULT_PREFIX, TIMESTAMP_FORMAT};
pub use report::{analysis_text, combined_report};
