//! Shared foundational types used across the Hilt transform toolchain.
//!
//! This crate provides content hashing for change detection, interned class
//! symbols for the resolution pool, path helpers for class files and jars,
//! and the internal-error type used to flag broken pipeline invariants.

#![warn(missing_docs)]

pub mod files;
pub mod hash;
pub mod result;
pub mod symbol;

pub use hash::ContentHash;
pub use result::{HiltResult, InternalError};
pub use symbol::{FrozenSymbols, Symbol, SymbolTable};
