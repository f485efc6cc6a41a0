//! Build argument composition.
//!
//! This module turns a validated spec into the CMake-style argument list the
//! orchestrator passes to the build tool.

pub mod args;
pub mod cmake;

pub use args::{generate, ArgumentGenerator, ArgumentStyle, CompositionError};
pub use cmake::{define_from_variant, Define};
