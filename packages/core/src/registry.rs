//! Named storage adapters, kept in insertion order.

use std::sync::Mutex;

use cabinet_backend::BackendBox;

/// A registered backend together with the key it was registered under.
///
/// Cloning an adapter clones the `Arc` handle, so an adapter pulled out of
/// the registry keeps working even if the registry is mutated afterwards.
#[derive(Clone)]
pub struct Adapter {
    pub key: String,
    pub backend: BackendBox,
}

struct Inner {
    entries: Vec<Adapter>,
    default_key: Option<String>,
}

/// Thread-safe registry mapping string keys to backends.
///
/// Registration order is observable: `keys` reports it, and the default
/// adapter is the oldest still-registered one. A single mutex guards the
/// whole state; operations only hold it long enough to clone handles out.
pub struct AdapterRegistry {
    inner: Mutex<Inner>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry {
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                default_key: None,
            }),
        }
    }

    /// Register a backend under `key`. Re-registering an existing key
    /// replaces the backend in place, keeping the key's position and its
    /// default status. The first key ever added becomes the default.
    pub fn add(&self, key: &str, backend: BackendBox) {
        let mut inner = self.inner.lock().unwrap();
        let adapter = Adapter {
            key: key.to_string(),
            backend,
        };
        match inner.entries.iter_mut().find(|a| a.key == key) {
            Some(slot) => *slot = adapter,
            None => inner.entries.push(adapter),
        }
        if inner.default_key.is_none() {
            inner.default_key = Some(key.to_string());
        }
        log::debug!("Registered adapter '{}'", key);
    }

    /// Remove the adapter registered under `key`, if any. Removing the
    /// default promotes the oldest surviving adapter.
    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.retain(|a| a.key != key);
        if inner.default_key.as_deref() == Some(key) {
            inner.default_key = inner.entries.first().map(|a| a.key.clone());
        }
    }

    /// Drop every adapter.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.default_key = None;
    }

    /// Exact lookup by key. `None` for unknown keys; callers decide how to
    /// fall back.
    pub fn lookup(&self, key: &str) -> Option<Adapter> {
        let inner = self.inner.lock().unwrap();
        inner.entries.iter().find(|a| a.key == key).cloned()
    }

    /// Lookup honoring the default: an absent, empty, or unknown key yields
    /// the default adapter. `None` only when the registry is empty.
    pub fn get(&self, key: Option<&str>) -> Option<Adapter> {
        let inner = self.inner.lock().unwrap();
        if let Some(k) = key.filter(|k| !k.is_empty()) {
            if let Some(found) = inner.entries.iter().find(|a| a.key == k) {
                return Some(found.clone());
            }
        }
        let default = inner.default_key.as_deref()?;
        inner.entries.iter().find(|a| a.key == default).cloned()
    }

    pub fn default_adapter(&self) -> Option<Adapter> {
        self.get(None)
    }

    pub fn default_key(&self) -> Option<String> {
        self.inner.lock().unwrap().default_key.clone()
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.entries.iter().map(|a| a.key.clone()).collect()
    }

    /// Key and backend kind of every adapter, in registration order.
    pub fn snapshot(&self) -> Vec<(String, &'static str)> {
        let inner = self.inner.lock().unwrap();
        inner
            .entries
            .iter()
            .map(|a| (a.key.clone(), a.backend.kind()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().entries.is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        AdapterRegistry::new()
    }
}
