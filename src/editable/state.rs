use std::fmt;

/// Edit state of one wrapper.
///
/// `Dirty`, `Deleted` and `New` can hold together; `Clean` means none of
/// them does.
///
/// ```text
/// Clean ──write──> Dirty ──commit/undo──> Clean
///   │                │
///   └──delete──> Deleted <──delete─┘   (undo clears Deleted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditState {
    pub dirty: bool,
    pub deleted: bool,
    pub new: bool,
}

impl EditState {
    pub fn is_clean(&self) -> bool {
        !self.has_changes()
    }

    pub fn has_changes(&self) -> bool {
        self.dirty || self.deleted || self.new
    }
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "CLEAN");
        }

        let labels = [
            (self.new, "NEW"),
            (self.dirty, "DIRTY"),
            (self.deleted, "DELETED"),
        ];
        let active = labels
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, label)| *label)
            .collect::<Vec<_>>();
        write!(f, "{}", active.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(EditState::default().to_string(), "CLEAN");
        let state = EditState {
            dirty: true,
            deleted: true,
            new: false,
        };
        assert_eq!(state.to_string(), "DIRTY|DELETED");
        assert!(state.has_changes());
    }
}
