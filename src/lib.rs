//! A small virtual machine for an 8-bit-cell tape language.
//!
//! Source text is lexed down to its eight instruction symbols, loaded onto
//! a [`tape::Tape`], and run by an [`engine::Engine`] against a bounded
//! [`memory::Memory`]. Console input and output are injected through the
//! [`io`] traits; the library never prints.

pub mod error;
pub mod symbol;
pub mod lexer;
pub mod tape;
pub mod memory;
pub mod io;
pub mod engine;

pub use engine::{CountMode, Engine, EngineConfig, EngineState, ExecutionResult};
pub use error::{Error, Result};
