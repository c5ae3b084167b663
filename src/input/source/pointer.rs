use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Registered consumer of pointer samples
#[derive(Debug, Clone, PartialEq, Eq)]
struct Handler {
    id: u64,
    name: String,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    /// Registration order, the last entry is the active handler
    handlers: Vec<Handler>,
}

/// The host pointer subsystem. Any number of consumers may subscribe, but
/// only the most recent subscription is active and receives samples.
#[derive(Debug, Clone, Default)]
pub struct PointerSource {
    registry: Arc<Mutex<Registry>>,
}

impl PointerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new handler and make it the active one. The returned
    /// [Subscription] unsubscribes when dropped.
    pub fn subscribe(&self, name: &str) -> Subscription {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push(Handler {
            id,
            name: name.to_string(),
        });
        log::debug!("Pointer handler '{name}' ({id}) subscribed");

        Subscription {
            id,
            name: name.to_string(),
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Name of the handler currently receiving samples
    pub fn active(&self) -> Option<String> {
        lock(&self.registry)
            .handlers
            .last()
            .map(|handler| handler.name.clone())
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        lock(&self.registry).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a registration with a [PointerSource]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    name: String,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns true if this subscription is the one receiving samples
    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let registry = lock(&registry);
        registry
            .handlers
            .last()
            .is_some_and(|handler| handler.id == self.id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        registry.handlers.retain(|handler| handler.id != self.id);
        log::debug!("Pointer handler '{}' ({}) unsubscribed", self.name, self.id);
    }
}

// The registry holds no invariant a panicking holder could break
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
