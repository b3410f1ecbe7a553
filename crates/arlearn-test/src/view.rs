//! Recording view
//!
//! A [`ViewSurface`] whose state and write log stay readable through a
//! shared handle after the view itself has been handed to an app.

use std::sync::Arc;

use parking_lot::Mutex;

use arlearn_flow::{primary_regions, InMemoryView, ViewSurface};

/// One write to the view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewOp {
    Visible { region: String, visible: bool },
    Text { element: String, text: String },
    List { element: String, items: Vec<String> },
}

#[derive(Debug, Default)]
struct Shared {
    view: InMemoryView,
    log: Vec<ViewOp>,
}

/// View that records every write
#[derive(Clone, Debug, Default)]
pub struct RecordingView {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Another handle onto the same view
    pub fn handle(&self) -> RecordingView {
        self.clone()
    }

    pub fn ops(&self) -> Vec<ViewOp> {
        self.shared.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.shared.lock().log.clear();
    }

    /// Primary regions currently visible
    pub fn visible_primary(&self) -> Vec<&'static str> {
        let shared = self.shared.lock();
        primary_regions().filter(|r| shared.view.is_visible(r)).collect()
    }

    pub fn visible_regions(&self) -> Vec<String> {
        self.shared.lock().view.visible_regions()
    }

    pub fn text_of(&self, element: &str) -> Option<String> {
        self.shared.lock().view.text(element)
    }

    pub fn list_of(&self, element: &str) -> Option<Vec<String>> {
        self.shared.lock().view.list(element)
    }

    /// Every text ever written to `element`, in order
    pub fn text_history(&self, element: &str) -> Vec<String> {
        self.shared
            .lock()
            .log
            .iter()
            .filter_map(|op| match op {
                ViewOp::Text { element: e, text } if e == element => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ViewSurface for RecordingView {
    fn set_visible(&mut self, region: &str, visible: bool) {
        let mut shared = self.shared.lock();
        shared.view.set_visible(region, visible);
        shared.log.push(ViewOp::Visible {
            region: region.to_string(),
            visible,
        });
    }

    fn is_visible(&self, region: &str) -> bool {
        self.shared.lock().view.is_visible(region)
    }

    fn set_text(&mut self, element: &str, text: &str) {
        let mut shared = self.shared.lock();
        shared.view.set_text(element, text);
        shared.log.push(ViewOp::Text {
            element: element.to_string(),
            text: text.to_string(),
        });
    }

    fn text(&self, element: &str) -> Option<String> {
        self.shared.lock().view.text(element)
    }

    fn set_list(&mut self, element: &str, items: &[String]) {
        let mut shared = self.shared.lock();
        shared.view.set_list(element, items);
        shared.log.push(ViewOp::List {
            element: element.to_string(),
            items: items.to_vec(),
        });
    }

    fn list(&self, element: &str) -> Option<Vec<String>> {
        self.shared.lock().view.list(element)
    }
}
