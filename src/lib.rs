//! Identifies files by their contents, the way `file(1)` does.
//!
//! [`cli`] implements the `file` command on top of the [`engine::Engine`]
//! trait, and [`engine::Magic`] is the engine it ships with: a magic
//! database parsed by [`parser`] into the rule tree of [`magic`].

pub mod cli;
pub mod compiled;
pub mod data_type;
pub mod endian;
pub mod engine;
pub mod error;
pub mod flags;
pub mod magic;
pub mod parser;

pub use crate::engine::{Engine, Magic};
pub use crate::error::{MagicError, MagicResult};
pub use crate::flags::Flags;
