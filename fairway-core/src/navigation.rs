use std::sync::Mutex;

/// Client-side routing, as seen by the wizard. The host application owns
/// the real router; the wizard only ever asks for a transition.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that records every transition. Used by tests to assert on
/// guard redirects and page advancement.
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.visited.lock().expect("navigator lock poisoned").clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited
            .lock()
            .expect("navigator lock poisoned")
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.visited
            .lock()
            .expect("navigator lock poisoned")
            .push(path.to_string());
    }
}
