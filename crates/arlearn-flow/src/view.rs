//! View surface
//!
//! The host UI (DOM, native widgets, terminal) implements [`ViewSurface`].
//! Regions are toggled by the state machine; text and list elements are
//! filled in by the application.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::all_regions;

/// Text element of the single advance control
pub const ADVANCE_BUTTON: &str = "scenario-ui-prompt-button";

/// Host UI seam
pub trait ViewSurface {
    fn set_visible(&mut self, region: &str, visible: bool);

    fn is_visible(&self, region: &str) -> bool;

    fn set_text(&mut self, element: &str, text: &str);

    /// Current text of an element, if it was ever set
    fn text(&self, element: &str) -> Option<String>;

    fn set_list(&mut self, element: &str, items: &[String]);

    fn list(&self, element: &str) -> Option<Vec<String>>;
}

/// Content access to a view. Managed regions stay under the state
/// machine's control.
pub struct DisplayContent<'a> {
    view: &'a mut dyn ViewSurface,
}

impl<'a> DisplayContent<'a> {
    pub fn new(view: &'a mut dyn ViewSurface) -> Self {
        DisplayContent { view }
    }

    pub fn set_text(&mut self, element: &str, text: &str) {
        self.view.set_text(element, text);
    }

    pub fn text(&self, element: &str) -> Option<String> {
        self.view.text(element)
    }

    pub fn set_list(&mut self, element: &str, items: &[String]) {
        self.view.set_list(element, items);
    }

    pub fn list(&self, element: &str) -> Option<Vec<String>> {
        self.view.list(element)
    }

    /// Toggle an element inside a region. Returns false, leaving the view
    /// untouched, for regions the state machine manages.
    pub fn set_element_visible(&mut self, element: &str, visible: bool) -> bool {
        if all_regions().any(|region| region == element) {
            tracing::warn!(element, "region visibility only changes through transitions");
            return false;
        }
        self.view.set_visible(element, visible);
        true
    }

    pub fn is_visible(&self, element: &str) -> bool {
        self.view.is_visible(element)
    }
}

/// View that keeps everything in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryView {
    visible: BTreeSet<String>,
    texts: BTreeMap<String, String>,
    lists: BTreeMap<String, Vec<String>>,
}

impl InMemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible regions in name order
    pub fn visible_regions(&self) -> Vec<String> {
        self.visible.iter().cloned().collect()
    }
}

impl ViewSurface for InMemoryView {
    fn set_visible(&mut self, region: &str, visible: bool) {
        if visible {
            self.visible.insert(region.to_string());
        } else {
            self.visible.remove(region);
        }
    }

    fn is_visible(&self, region: &str) -> bool {
        self.visible.contains(region)
    }

    fn set_text(&mut self, element: &str, text: &str) {
        self.texts.insert(element.to_string(), text.to_string());
    }

    fn text(&self, element: &str) -> Option<String> {
        self.texts.get(element).cloned()
    }

    fn set_list(&mut self, element: &str, items: &[String]) {
        self.lists.insert(element.to_string(), items.to_vec());
    }

    fn list(&self, element: &str) -> Option<Vec<String>> {
        self.lists.get(element).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_view() {
        let mut view = InMemoryView::new();

        view.set_visible("menu-section", true);
        view.set_visible("topics", true);
        view.set_visible("topics", false);
        view.set_text("progress-counter", "1 of 4 completed");
        view.set_list("completed-topics-list", &["✓ A".to_string()]);

        assert_eq!(view.visible_regions(), vec!["menu-section"]);
        assert_eq!(view.text("progress-counter").as_deref(), Some("1 of 4 completed"));
        assert_eq!(view.text("missing"), None);
        assert_eq!(view.list("completed-topics-list").unwrap().len(), 1);
    }

    #[test]
    fn test_display_content_leaves_regions_alone() {
        let mut view = InMemoryView::new();
        let mut content = DisplayContent::new(&mut view);

        assert!(!content.set_element_visible("menu-section", true));
        assert!(!content.set_element_visible("progress", true));
        assert!(content.set_element_visible("ar-status", true));
        content.set_text("ar-status", "AR is not supported on this device");

        assert_eq!(view.visible_regions(), vec!["ar-status"]);
        assert!(view.text("ar-status").is_some());
    }
}
