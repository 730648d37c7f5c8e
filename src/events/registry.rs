use super::{Listener, SessionEvent};

/// Listeners attached to one session manager.
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn dispatch(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener.handle(event);
        }
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;

    struct Recorder(Arc<Mutex<Vec<&'static str>>>, &'static str);

    impl Listener for Recorder {
        fn handle(&self, _event: &SessionEvent) {
            self.0.lock().unwrap().push(self.1);
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();
        registry
            .listen(Recorder(Arc::clone(&calls), "first"))
            .listen(Recorder(Arc::clone(&calls), "second"));
        assert_eq!(registry.len(), 2);

        registry.dispatch(&SessionEvent::SessionRestored {
            username: "admin".to_owned(),
            at: Utc::now(),
        });

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_empty_registry_is_noop() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());
        registry.dispatch(&SessionEvent::StaleSessionCleared {
            status: None,
            at: Utc::now(),
        });
    }
}
