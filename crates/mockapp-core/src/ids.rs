//! Monotonic identifier allocation for generated symbols.

/// Hands out increasing integer ids for classes and functions.
///
/// Ids are unique per generator instance. Share one generator across a whole
/// project run so every class name in the output is distinct.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Start counting at `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Return the next id and advance.
    pub const fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }
}
