//! CLI command implementations.

pub mod common;
pub mod pattern;
pub mod presets;
pub mod simulate;
