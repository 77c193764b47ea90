//! Business model canvas input.
//!
//! A canvas is nine free-text building blocks. This module defines the
//! fields, the [`CanvasInput`] record collected from the user, and the
//! labeled [`CanvasDescription`] that seeds the prompt chain.
//!
//! ```ignore
//! use canvas_forge::canvas::{CanvasField, CanvasInput};
//!
//! let canvas = CanvasInput::new()
//!     .with(CanvasField::ValueProposition, "Same-day repairs")
//!     .with(CanvasField::CustomerProfile, "Small bike shops");
//! println!("{}", canvas.describe());
//! ```

mod fields;
mod input;

pub use fields::CanvasField;
pub use input::{CanvasDescription, CanvasInput};
