//! Menu Selection Registry
//!
//! Tracks which named menu ("Headlight", "Gear", ...) is active. At most one
//! name is selected at a time; selecting the active name again clears it and
//! selecting another name replaces it.
//!
//! The registry is an explicitly constructed, cloneable handle. Every clone
//! shares the same cell, so the composition root creates one and passes
//! clones to the controllers that need it.

use std::sync::{Arc, RwLock};
use tracing::debug;

/// Shared single-selection state
#[derive(Debug, Clone, Default)]
pub struct SelectionRegistry {
    selected: Arc<RwLock<String>>,
}

/// Read-only copy of the selection taken once per tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSnapshot {
    selected: String,
}

impl SelectionSnapshot {
    /// Selected name, empty when nothing is selected
    pub fn selected_name(&self) -> &str {
        &self.selected
    }

    /// `name` was selected when the snapshot was taken
    pub fn is_selected(&self, name: &str) -> bool {
        !self.selected.is_empty() && self.selected == name
    }
}

impl SelectionRegistry {
    /// Registry with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, String> {
        match self.selected.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, String> {
        match self.selected.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Select `name`, or clear the selection when `name` is already selected.
    /// Empty or whitespace-only names are ignored.
    pub fn select(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut current = self.write();
        if *current == name {
            current.clear();
            debug!("Selection cleared (toggle off)");
            return;
        }

        if current.is_empty() {
            debug!("Selected = {}", name);
        } else {
            debug!("Selection switched: {} -> {}", current, name);
        }
        *current = name.to_string();
    }

    /// Clear the selection only if `name` is the selected one
    pub fn clear(&self, name: &str) {
        let name = name.trim();
        let mut current = self.write();
        if *current == name {
            current.clear();
            debug!("Selection cleared");
        }
    }

    /// Clear unconditionally
    pub fn clear_all(&self) {
        self.write().clear();
        debug!("Selection cleared (all)");
    }

    /// `name` is the current selection
    pub fn is_selected(&self, name: &str) -> bool {
        let current = self.read();
        !current.is_empty() && *current == name
    }

    /// Selected name, empty when nothing is selected
    pub fn selected_name(&self) -> String {
        self.read().clone()
    }

    /// Copy of the current selection
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected: self.selected_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = SelectionRegistry::new();
        let b = a.clone();
        a.select("Door");
        assert!(b.is_selected("Door"));
        b.clear_all();
        assert_eq!(a.selected_name(), "");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let reg = SelectionRegistry::new();
        reg.select("  Gear ");
        assert_eq!(reg.selected_name(), "Gear");
        reg.select("   ");
        assert_eq!(reg.selected_name(), "Gear");
    }

    #[test]
    fn test_clear_other_name_is_noop() {
        let reg = SelectionRegistry::new();
        reg.select("Wiper");
        reg.clear("Door");
        assert!(reg.is_selected("Wiper"));
        reg.clear("Wiper");
        assert!(!reg.is_selected("Wiper"));
    }

    #[test]
    fn test_empty_name_is_never_selected() {
        let reg = SelectionRegistry::new();
        assert!(!reg.is_selected(""));
        assert!(!reg.snapshot().is_selected(""));
    }
}
