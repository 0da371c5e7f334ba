use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// An interned symbol.
///
/// Symbols produced by the same [`SymbolTable`] share one allocation, so
/// [`Symbol::same`] is the identity test. Equality and hashing use the name.
#[derive(Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn same(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide symbol interning table.
#[derive(Default)]
pub struct SymbolTable {
    symbols: Mutex<FxHashMap<Arc<str>, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, name: &str) -> Symbol {
        let mut symbols = self.symbols.lock();
        if let Some(symbol) = symbols.get(name) {
            return symbol.clone();
        }
        let key: Arc<str> = Arc::from(name);
        let symbol = Symbol(key.clone());
        symbols.insert(key, symbol.clone());
        symbol
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_returns_same_symbol() {
        let table = SymbolTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        assert!(a.same(&b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_tables_are_equal_but_not_same() {
        let a = SymbolTable::new().intern("foo");
        let b = SymbolTable::new().intern("foo");
        assert_eq!(a, b);
        assert!(!a.same(&b));
    }

    #[test]
    fn test_symbol_debug_form() {
        let table = SymbolTable::new();
        assert_eq!(format!("{:?}", table.intern("upcase")), ":upcase");
    }
}
