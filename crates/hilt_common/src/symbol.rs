//! Interned class-name symbols.
//!
//! The class-resolution pool indexes every class name found on the input
//! roots. Names are interned while the pool is being populated and then
//! frozen into a read-only table that rewrite workers share across threads.

use lasso::{Rodeo, RodeoReader};
use serde::{Deserialize, Serialize};

/// An interned class name.
///
/// A `u32` index into the [`SymbolTable`] that produced it. Equality and
/// hashing are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    /// Returns the raw index of this symbol.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Symbol` wraps a `u32`, and `try_from_usize` rejects any index that
// does not fit, so every value handed out round-trips through `into_usize`.
unsafe impl lasso::Key for Symbol {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Symbol)
    }
}

/// Mutable interner used while a pool is being populated.
pub struct SymbolTable {
    rodeo: Rodeo<Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns `name`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.rodeo.get_or_intern(name)
    }

    /// Looks up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.rodeo.get(name)
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Ends population. The returned table can no longer grow and is safe to
    /// share between threads.
    pub fn freeze(self) -> FrozenSymbols {
        FrozenSymbols {
            reader: self.rodeo.into_reader(),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a populated [`SymbolTable`].
pub struct FrozenSymbols {
    reader: RodeoReader<Symbol>,
}

impl FrozenSymbols {
    /// Looks up a name. Returns `None` if it was never interned.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.reader.get(name)
    }

    /// Resolves a symbol back to its name.
    ///
    /// # Panics
    ///
    /// Panics if the symbol came from a different table.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.reader.resolve(&symbol)
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.reader.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("com/example/Foo");
        let b = table.intern("com/example/Foo");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_names_distinct_symbols() {
        let mut table = SymbolTable::new();
        let a = table.intern("com/example/Foo");
        let b = table.intern("com/example/Hilt_Foo");
        assert_ne!(a, b);
    }

    #[test]
    fn frozen_lookup_and_resolve() {
        let mut table = SymbolTable::new();
        let sym = table.intern("com/example/Hilt_Foo");
        let frozen = table.freeze();
        assert_eq!(frozen.get("com/example/Hilt_Foo"), Some(sym));
        assert_eq!(frozen.resolve(sym), "com/example/Hilt_Foo");
        assert!(frozen.get("com/example/Missing").is_none());
    }

    #[test]
    fn frozen_table_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<FrozenSymbols>();
    }
}
