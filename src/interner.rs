/// String interning for text columns
///
/// Text columns in viewer datasets are often categorical ("A", "B", "C" repeated
/// thousands of times). A store built with interning keeps each distinct string
/// once and stores a `StringId` per cell.
///
/// The store is immutable once built, so the interner is append-only: ids are
/// never released or reused, and `resolve` is valid for the life of the store.
///
/// # Examples
///
/// ```
/// use gridview::StringInterner;
///
/// let mut interner = StringInterner::new();
/// let a = interner.intern("x");
/// let b = interner.intern("y");
/// assert_eq!(interner.intern("x"), a);
/// assert_ne!(a, b);
/// assert_eq!(interner.resolve(a), Some("x"));
/// ```

use std::collections::HashMap;

/// Interned string ID type
pub type StringId = u32;

#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    lookup: HashMap<String, StringId>,
    /// index = id
    strings: Vec<String>,
    /// Number of cells referring to each id
    uses: Vec<u32>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StringInterner {
            lookup: HashMap::with_capacity(capacity),
            strings: Vec::with_capacity(capacity),
            uses: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning the existing id when it was seen before.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.lookup.get(s) {
            self.uses[id as usize] += 1;
            return id;
        }

        let id = self.strings.len() as StringId;
        self.strings.push(s.to_string());
        self.uses.push(1);
        self.lookup.insert(s.to_string(), id);
        id
    }

    /// Look up the id of an already interned string without interning it.
    pub fn lookup(&self, s: &str) -> Option<StringId> {
        self.lookup.get(s).copied()
    }

    pub fn resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id as usize).map(|s| s.as_str())
    }

    /// Number of cells that interned this id
    pub fn use_count(&self, id: StringId) -> u32 {
        self.uses.get(id as usize).copied().unwrap_or(0)
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        let string_bytes: usize = self
            .strings
            .iter()
            .map(|s| s.len() + std::mem::size_of::<String>())
            .sum();

        let map_overhead = self.lookup.capacity()
            * (std::mem::size_of::<String>() + std::mem::size_of::<StringId>());

        let vec_overhead = self.strings.capacity() * std::mem::size_of::<String>()
            + self.uses.capacity() * std::mem::size_of::<u32>();

        string_bytes + map_overhead + vec_overhead
    }

    pub fn stats(&self) -> InternerStats {
        InternerStats {
            unique_strings: self.len(),
            total_references: self.uses.iter().map(|&u| u as u64).sum(),
            memory_bytes: self.memory_usage(),
        }
    }
}

/// Statistics about a store's string interner
#[derive(Debug, Clone, PartialEq)]
pub struct InternerStats {
    pub unique_strings: usize,
    /// Number of interned cells across all text columns
    pub total_references: u64,
    pub memory_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_basic() {
        let mut interner = StringInterner::new();

        let id1 = interner.intern("hello");
        let id2 = interner.intern("world");
        let id3 = interner.intern("hello");

        assert_eq!(id1, id3);
        assert_ne!(id1, id2);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.use_count(id1), 2);
    }

    #[test]
    fn test_interner_lookup_does_not_intern() {
        let mut interner = StringInterner::new();
        interner.intern("present");

        assert!(interner.lookup("present").is_some());
        assert!(interner.lookup("absent").is_none());
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_interner_stats() {
        let mut interner = StringInterner::with_capacity(4);

        interner.intern("A");
        interner.intern("B");
        interner.intern("A");

        let stats = interner.stats();
        assert_eq!(stats.unique_strings, 2);
        assert_eq!(stats.total_references, 3);
        assert!(stats.memory_bytes > 0);
    }

    #[test]
    fn test_interner_empty_string() {
        let mut interner = StringInterner::new();

        let id = interner.intern("");
        assert_eq!(interner.resolve(id), Some(""));
        assert_eq!(interner.resolve(id + 1), None);
    }
}
