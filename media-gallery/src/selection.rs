use crate::models::MediaItem;
use std::collections::HashSet;

/// What a tap on a grid tile should do
#[derive(Debug, Clone, PartialEq)]
pub enum TapAction {
    /// Open the item fullscreen
    Open(MediaItem),
    /// Selection mode is active, the tile's checkbox was toggled
    Toggled { uri: String, selected: bool },
}

/// Multi-select state of the gallery grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    active: bool,
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selected(&self, uri: &str) -> bool {
        self.selected.contains(uri)
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Tap on a tile
    pub fn tap(&mut self, item: &MediaItem) -> TapAction {
        if self.active {
            let selected = self.toggle(&item.uri);
            TapAction::Toggled {
                uri: item.uri.clone(),
                selected,
            }
        } else {
            TapAction::Open(item.clone())
        }
    }

    /// Long-press enters selection mode with the pressed item selected
    pub fn long_press(&mut self, item: &MediaItem) {
        self.active = true;
        self.selected.insert(item.uri.clone());
    }

    /// Checkbox toggle, returns whether the URI is now selected
    pub fn toggle(&mut self, uri: &str) -> bool {
        if !self.selected.remove(uri) {
            self.selected.insert(uri.to_string());
            true
        } else {
            false
        }
    }

    /// The "Select" / "Cancel" header button
    pub fn toggle_mode(&mut self) {
        if self.active {
            self.cancel();
        } else {
            self.active = true;
        }
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.selected.clear();
    }

    /// Drop selections whose items vanished after a reload
    pub fn retain_existing(&mut self, items: &[MediaItem]) {
        let existing: HashSet<&str> = items.iter().map(|i| i.uri.as_str()).collect();
        self.selected.retain(|uri| existing.contains(uri.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_opens_when_inactive() {
        let mut selection = SelectionState::new();
        let item = MediaItem::photo("a");
        assert_eq!(selection.tap(&item), TapAction::Open(item));
        assert!(!selection.is_active());
    }

    #[test]
    fn test_long_press_then_tap_toggles() {
        let mut selection = SelectionState::new();
        let a = MediaItem::photo("a");
        let b = MediaItem::video("b");

        selection.long_press(&a);
        assert!(selection.is_active());
        assert!(selection.is_selected("a"));

        assert_eq!(
            selection.tap(&b),
            TapAction::Toggled {
                uri: "b".to_string(),
                selected: true
            }
        );
        assert_eq!(
            selection.tap(&a),
            TapAction::Toggled {
                uri: "a".to_string(),
                selected: false
            }
        );
        assert_eq!(selection.count(), 1);
    }

    #[test]
    fn test_cancel_clears() {
        let mut selection = SelectionState::new();
        selection.long_press(&MediaItem::photo("a"));
        selection.toggle_mode();
        assert!(!selection.is_active());
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_retain_existing() {
        let mut selection = SelectionState::new();
        selection.long_press(&MediaItem::photo("a"));
        selection.toggle("gone");
        selection.retain_existing(&[MediaItem::photo("a")]);
        assert!(selection.is_selected("a"));
        assert!(!selection.is_selected("gone"));
    }
}
