use std::collections::HashSet;

/// Names bound in one Lua-visible scope, one set per nested block.
///
/// The base set is never popped, so a table always has somewhere to record a
/// binding.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    sets: Vec<HashSet<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            sets: vec![HashSet::new()],
        }
    }

    /// Record `name` in the innermost block.
    pub fn add(&mut self, name: impl Into<String>) {
        if let Some(innermost) = self.sets.last_mut() {
            innermost.insert(name.into());
        }
    }

    /// Whether `name` is bound in any enclosing block.
    pub fn exists(&self, name: &str) -> bool {
        self.sets.iter().any(|set| set.contains(name))
    }

    pub fn push(&mut self) {
        self.sets.push(HashSet::new());
    }

    /// Drop the innermost block. Returns `false` (and keeps the base set) when
    /// there is nothing to pop.
    pub fn pop(&mut self) -> bool {
        if self.sets.len() > 1 {
            self.sets.pop();
            true
        } else {
            false
        }
    }

    pub fn depth(&self) -> usize {
        self.sets.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
