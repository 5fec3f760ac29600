use std::sync::{Mutex, Weak};

use tracing::debug;

use crate::store::StoreInner;

/// Keeps a state callback registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<Mutex<StoreInner>>,
    src: String,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(inner: Weak<Mutex<StoreInner>>, src: String, id: u64) -> Self {
        Self { inner, src, id }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn unsubscribe(self) {
        // drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.remove_subscriber(&self.src, self.id);
        debug!("Unsubscribed {} from {}", self.id, self.src);
    }
}
