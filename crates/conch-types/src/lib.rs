//! Shared types for the conch console.
//!
//! This crate contains the pieces every other conch crate agrees on: the
//! error taxonomy produced by console operations and the enums selecting
//! how files are read and how directory listings are rendered.

pub mod error;
pub mod mode;

pub use error::{ConsoleError, Result};
pub use mode::{DisplayMode, ReadMode};
