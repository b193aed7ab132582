use std::sync::{Arc, Mutex};

/// Latest-value slot shared between threads. Writers replace the value,
/// readers clone it; every write bumps a version number.
#[derive(Debug)]
pub struct Slot<T> {
    inner: Arc<Mutex<(u64, T)>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Slot<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new((0, value))),
        }
    }

    pub fn set(&self, value: T) {
        if let Ok(mut g) = self.inner.lock() {
            g.0 += 1;
            g.1 = value;
        }
    }

    pub fn get(&self) -> Option<T> {
        self.inner.lock().ok().map(|g| g.1.clone())
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().map(|g| g.0).unwrap_or(0)
    }

    /// The value, if it was written after version `seen`.
    pub fn newer_than(&self, seen: u64) -> Option<(u64, T)> {
        let g = self.inner.lock().ok()?;
        (g.0 > seen).then(|| (g.0, g.1.clone()))
    }
}
