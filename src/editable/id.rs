use std::sync::atomic::{AtomicU64, Ordering};

/// Global wrapper ID counter
static NEXT_EDITABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`EditableEntity`](super::EditableEntity) wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditableId(pub u64);

impl EditableId {
    /// Generate a new unique wrapper ID
    pub fn new() -> Self {
        EditableId(NEXT_EDITABLE_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for EditableId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EditableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "editable_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = EditableId::new();
        let b = EditableId::new();
        assert_ne!(a, b);
        assert!(b > a);
        assert_eq!(a.to_string(), format!("editable_{}", a.as_u64()));
    }
}
