//! Fresh logical variable names.
//!
//! The [`VariableAllocator`] hands out `A`..`Z`, then `Var1`, `Var2`, ...,
//! skipping names already in use. Its cursor only moves forward, so a name is
//! never handed out twice by one allocator. Cloning is cheap, which lets
//! candidate generation allocate speculatively on a copy without committing.

use std::collections::HashSet;

/// Number of single-letter names before the `VarN` sequence starts.
const LETTERS: usize = 26;

/// Allocator of fresh variable names.
#[derive(Debug, Clone, Default)]
pub struct VariableAllocator {
    used: HashSet<String>,
    cursor: usize,
}

impl VariableAllocator {
    /// Create an allocator with no names in use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator that will never return any of `used`.
    pub fn with_used<I, S>(used: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: used.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    fn name_at(cursor: usize) -> String {
        if cursor < LETTERS {
            char::from(b'A' + cursor as u8).to_string()
        } else {
            format!("Var{}", cursor - LETTERS + 1)
        }
    }

    /// Reserve and return the next free name.
    pub fn next(&mut self) -> String {
        while self.used.contains(&Self::name_at(self.cursor)) {
            self.cursor += 1;
        }
        let name = Self::name_at(self.cursor);
        self.cursor += 1;
        self.used.insert(name.clone());
        name
    }

    /// Mark a name as used without moving the cursor.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn used(&self) -> &HashSet<String> {
        &self.used
    }
}
