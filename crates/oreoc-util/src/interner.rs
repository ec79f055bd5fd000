use rustc_hash::FxHashMap;

/// An interned string. Two `Symbol`s compare equal iff they were interned
/// from equal strings, so callers can use `Symbol` as a cheap `Copy` key
/// instead of cloning `String`s around — used by the TAC emitter to give
/// every named (`v_`-prefixed) source variable a single stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

/// Interns strings into [`Symbol`]s, backed by `rustc_hash::FxHashMap` as
/// the teacher's own string table does.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<String, u32>,
    strings: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.map.get(s) {
            return Symbol(id);
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_owned());
        self.map.insert(s.to_owned(), id);
        Symbol(id)
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_interns_to_same_symbol() {
        let mut interner = Interner::new();
        let a = interner.intern("x");
        let b = interner.intern("x");
        let c = interner.intern("y");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "x");
        assert_eq!(interner.resolve(c), "y");
    }

    proptest::proptest! {
        #[test]
        fn interning_is_idempotent_and_round_trips(names in proptest::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,15}", 0..30)) {
            let mut interner = Interner::new();
            let symbols: Vec<_> = names.iter().map(|n| interner.intern(n)).collect();
            for (name, symbol) in names.iter().zip(&symbols) {
                proptest::prop_assert_eq!(interner.resolve(*symbol), name.as_str());
            }
            // Interning the same names again yields the same symbols, in order.
            let again: Vec<_> = names.iter().map(|n| interner.intern(n)).collect();
            proptest::prop_assert_eq!(symbols, again);
        }
    }
}
