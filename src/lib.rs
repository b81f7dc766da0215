//! Displays a CPU-side scalar field on a GPU texture, re-uploaded every frame.

pub mod config;
pub mod error;
pub mod field;
pub mod framework;
pub mod mesh;
pub mod shader;
pub mod simulation;
pub mod texture;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
