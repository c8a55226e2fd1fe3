//! ID generation utilities.

use ulid::Ulid;

/// ID generator for entities.
///
/// Every row in the store carries an opaque lowercase ULID, so ids sort by
/// creation time and never leak a sequence count.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a monotonic batch of ids for rows written in one transaction.
    ///
    /// Timeline entries appended together rely on the id to break ties between
    /// identical `created_at` values, so the batch is strictly increasing.
    #[must_use]
    pub fn generate_ordered(&self, count: usize) -> Vec<String> {
        let mut generator = ulid::Generator::new();
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let next = generator.generate().unwrap_or_else(|_| Ulid::new());
            ids.push(next.to_string().to_lowercase());
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_ordered_is_strictly_increasing() {
        let ids = IdGenerator::new().generate_ordered(5);
        assert_eq!(ids.len(), 5);
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
