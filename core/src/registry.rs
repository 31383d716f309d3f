use crate::backend::ViewManager;
use core::fmt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable snapshot of the registered view managers.
#[derive(Clone, Default)]
pub struct Catalog {
    managers: HashMap<String, Arc<dyn ViewManager>>,
    direct_events: HashMap<String, String>,
}

impl Catalog {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ViewManager>> {
        self.managers.get(name)
    }

    /// The engine-side name of a native direct event, if any view manager exports one.
    pub fn direct_event_name(&self, native_name: &str) -> Option<&str> {
        self.direct_events.get(native_name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Catalog")
            .field("managers", &names)
            .field("direct_events", &self.direct_events.len())
            .finish()
    }
}

/// Registry of view managers by name.
///
/// Registration copies the catalog; readers hold on to a snapshot and never block writers for
/// longer than an `Arc` clone.
#[derive(Debug, Default)]
pub struct ViewManagerRegistry {
    current: RwLock<Arc<Catalog>>,
}

impl ViewManagerRegistry {
    pub fn new() -> ViewManagerRegistry {
        ViewManagerRegistry::default()
    }

    /// Registers a view manager, returning the one it replaced.
    pub fn register(&self, manager: Arc<dyn ViewManager>) -> Option<Arc<dyn ViewManager>> {
        let mut current = self.current.write();
        let mut next = (**current).clone();
        for (native, engine) in manager.direct_event_names() {
            next.direct_events.insert(native, engine);
        }
        let replaced = next.managers.insert(manager.name().to_owned(), manager);
        *current = Arc::new(next);
        replaced
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&*self.current.read())
    }
}
