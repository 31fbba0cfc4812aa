use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Collapses concurrent requests for the same key into one in-flight call.
///
/// Every caller that arrives while a call for `key` is pending receives a
/// clone of that call's result. The key is dropped as soon as the call
/// settles, whether it succeeded or failed, so the next caller starts fresh.
pub struct RequestDeduplicator<T> {
    in_flight: DashMap<String, Arc<OnceCell<T>>>,
}

impl<T: Clone> RequestDeduplicator<T> {
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    pub async fn run<F, Fut>(&self, key: &str, make_request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // Clone the cell out so no map lock is held across the await
        let cell = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if cell.initialized() {
            debug!(key = %key, "Reusing settled request");
        }
        let result = cell.get_or_init(make_request).await.clone();

        self.in_flight.remove_if(key, |_, current| Arc::ptr_eq(current, &cell));
        result
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl<T: Clone> Default for RequestDeduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}
