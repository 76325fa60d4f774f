//! Core abstractions for header-to-diagram processing
//!
//! Shared types, the rendering trait every diagram element implements,
//! error handling, logging and text utilities.

pub mod chumsky_utils;
mod error;
pub mod logging;
mod render;
mod text;
mod types;

pub use error::*;
pub use logging::*;
pub use render::*;
pub use text::*;
pub use types::*;
