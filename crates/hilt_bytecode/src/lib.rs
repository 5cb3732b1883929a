//! Class-file rewriting for Hilt entry points.
//!
//! Classes annotated with an entry-point marker are rewritten to extend the
//! generated `Hilt_` base class produced earlier in the build. The crate
//! holds a small class-file codec ([`ClassFile`], [`ConstantPool`]), the
//! read-only [`ClassPool`] used to check that generated classes exist, and
//! the [`ClassTransformer`] that applies the rewrite to files and jars.

#![warn(missing_docs)]

pub mod annotations;
pub mod classfile;
pub mod code;
pub mod constant_pool;
pub mod error;
pub mod name;
pub mod pool;
mod reader;
pub mod rewriter;

#[cfg(test)]
pub(crate) mod testing;

pub use classfile::{Attribute, ClassFile, Member};
pub use constant_pool::{Constant, ConstantPool};
pub use error::{ClassFormatError, RewriteError};
pub use pool::{ClassPool, ClassPoolBuilder};
pub use rewriter::{ClassOutcome, ClassTransformer, FileOutcome, RewriteMode, RewriteOptions};
