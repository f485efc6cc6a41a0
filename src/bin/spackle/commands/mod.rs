//! Command implementations

pub mod args;
pub mod check;
pub mod completions;
pub mod microarch;
pub mod variants;
