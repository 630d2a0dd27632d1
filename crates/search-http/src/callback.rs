//! Callback call surface.
//!
//! Every operation takes an optional callback receiving
//! `(error, value, raw_response)`. Argument errors are returned directly from
//! the call and the callback is never invoked for them. Otherwise the request
//! runs as an independent Tokio task and the callback fires at most once with
//! its outcome; without a callback the request still runs and the outcome is
//! discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use search::endpoints::{self, ApiCall};
use search::{FromBody, QueryParams, RawResponse, SearchAction, SearchClient, SearchError, SearchTransport};

/// Receives the outcome of one request.
pub type Callback<T> =
    Box<dyn FnOnce(Option<SearchError>, Option<T>, Option<RawResponse>) + Send + 'static>;

/// Boxes a closure as a [`Callback`].
pub fn callback<T, F>(f: F) -> Option<Callback<T>>
where
    F: FnOnce(Option<SearchError>, Option<T>, Option<RawResponse>) + Send + 'static,
{
    Some(Box::new(f))
}

// ---------------------------------------------------------------------------
// One-shot guard
// ---------------------------------------------------------------------------

/// Holds a callback and lets it fire at most once.
///
/// The first [`fire`](Self::fire) flips the `fired` flag and consumes the
/// callback; every later call is a no-op returning `false`.
pub struct OnceCallback<T> {
    fired: AtomicBool,
    slot: Mutex<Option<Callback<T>>>,
}

impl<T> OnceCallback<T> {
    /// Arms the guard.
    pub fn new(callback: Callback<T>) -> Self {
        Self {
            fired: AtomicBool::new(false),
            slot: Mutex::new(Some(callback)),
        }
    }

    /// Delivers an outcome. Returns `true` only for the delivery that
    /// actually reached the callback.
    pub fn fire(
        &self,
        error: Option<SearchError>,
        value: Option<T>,
        raw: Option<RawResponse>,
    ) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        let taken = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match taken {
            Some(callback) => {
                callback(error, value, raw);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once an outcome has been delivered.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// CallbackClient
// ---------------------------------------------------------------------------

/// Callback-style facade over a [`SearchClient`].
pub struct CallbackClient<T> {
    inner: SearchClient<T>,
    runtime: Handle,
}

impl<T: SearchTransport + 'static> CallbackClient<T> {
    /// Wraps `inner`, spawning requests on `runtime`.
    pub fn new(inner: SearchClient<T>, runtime: Handle) -> Self {
        Self { inner, runtime }
    }

    /// Wraps `inner`, spawning requests on the current Tokio runtime.
    ///
    /// ## Errors
    ///
    /// Returns an argument error when called outside a Tokio runtime.
    pub fn on_current_runtime(inner: SearchClient<T>) -> Result<Self, SearchError> {
        let runtime = Handle::try_current()
            .map_err(|e| SearchError::argument(format!("no Tokio runtime available: {e}")))?;
        Ok(Self::new(inner, runtime))
    }

    /// The wrapped async client.
    pub fn inner(&self) -> &SearchClient<T> {
        &self.inner
    }

    /// Runs `call` in its own task and delivers the outcome to `callback`.
    ///
    /// ## Errors
    ///
    /// Returns validation errors synchronously; no task is spawned and the
    /// callback is dropped unfired.
    pub fn dispatch<R: FromBody>(
        &self,
        call: ApiCall<R>,
        callback: Option<Callback<R>>,
    ) -> Result<JoinHandle<()>, SearchError> {
        self.inner.validate(&call)?;
        let client = self.inner.clone();
        let guard = callback.map(OnceCallback::new);
        Ok(self.runtime.spawn(async move {
            let operation = call.operation();
            let exchange = client.execute(call).await;
            match guard {
                Some(guard) => {
                    let (error, value, raw) = exchange.into_parts();
                    guard.fire(error, value, raw);
                }
                None => debug!(operation, "outcome discarded: no callback"),
            }
        }))
    }
}

/// Generates one forwarding method per operation: build the descriptor
/// (argument errors return immediately), then dispatch.
macro_rules! forward {
    ($(
        $(#[$doc:meta])*
        $name:ident($($arg:ident: $ty:ty),*) -> $out:ty;
    )*) => {
        impl<T: SearchTransport + 'static> CallbackClient<T> {
            $(
                $(#[$doc])*
                pub fn $name(
                    &self,
                    $($arg: $ty,)*
                    callback: Option<Callback<$out>>,
                ) -> Result<JoinHandle<()>, SearchError> {
                    self.dispatch(endpoints::$name($($arg),*)?, callback)
                }
            )*
        }
    };
}

forward! {
    /// Lists index definitions.
    list_indexes() -> Vec<Value>;
    /// Creates an index.
    create_index(schema: Value) -> Value;
    /// Fetches an index definition.
    get_index(name: &str) -> Value;
    /// Creates or replaces an index.
    update_index(name: &str, schema: Value) -> Value;
    /// Deletes an index.
    delete_index(name: &str) -> Value;
    /// Fetches index statistics.
    get_index_stats(name: &str) -> Value;
    /// Runs an analyzer.
    analyze(name: &str, request: Value) -> Value;

    /// Lists indexers.
    list_indexers() -> Vec<Value>;
    /// Creates an indexer.
    create_indexer(definition: Value) -> Value;
    /// Fetches an indexer.
    get_indexer(name: &str) -> Value;
    /// Creates or replaces an indexer.
    update_indexer(name: &str, definition: Value) -> Value;
    /// Deletes an indexer.
    delete_indexer(name: &str) -> Value;
    /// Fetches indexer status.
    get_indexer_status(name: &str) -> Value;
    /// Starts an indexer run.
    run_indexer(name: &str) -> Value;
    /// Resets an indexer.
    reset_indexer(name: &str) -> Value;

    /// Lists data sources.
    list_data_sources() -> Vec<Value>;
    /// Creates a data source.
    create_data_source(definition: Value) -> Value;
    /// Fetches a data source.
    get_data_source(name: &str) -> Value;
    /// Creates or replaces a data source.
    update_data_source(name: &str, definition: Value) -> Value;
    /// Deletes a data source.
    delete_data_source(name: &str) -> Value;

    /// Lists synonym maps.
    list_synonym_maps() -> Vec<Value>;
    /// Creates a synonym map.
    create_synonym_map(definition: Value) -> Value;
    /// Fetches a synonym map.
    get_synonym_map(name: &str) -> Value;
    /// Creates or replaces a synonym map.
    update_synonym_map(name: &str, definition: Value) -> Value;
    /// Deletes a synonym map.
    delete_synonym_map(name: &str) -> Value;

    /// Lists skillsets.
    list_skillsets() -> Vec<Value>;
    /// Creates a skillset.
    create_skillset(definition: Value) -> Value;
    /// Fetches a skillset.
    get_skillset(name: &str) -> Value;
    /// Creates or replaces a skillset.
    update_skillset(name: &str, definition: Value) -> Value;
    /// Deletes a skillset.
    delete_skillset(name: &str) -> Value;

    /// Sends a batch without action markers.
    add_documents(index: &str, documents: Vec<Value>) -> Vec<Value>;
    /// Uploads documents.
    upload_documents(index: &str, documents: Vec<Value>) -> Vec<Value>;
    /// Merges documents.
    merge_documents(index: &str, documents: Vec<Value>) -> Vec<Value>;
    /// Merges or uploads documents.
    merge_or_upload_documents(index: &str, documents: Vec<Value>) -> Vec<Value>;
    /// Deletes documents by key.
    delete_documents(index: &str, keys: Vec<Value>) -> Vec<Value>;
    /// Sends a batch stamped with `action`.
    index_documents(index: &str, documents: Vec<Value>, action: SearchAction) -> Vec<Value>;
    /// Searches an index.
    search(index: &str, query: Value) -> Vec<Value>;
    /// Fetches a document by key.
    lookup(index: &str, key: &str) -> Value;
    /// Counts the documents in an index.
    count(index: &str) -> u64;
    /// Suggests with query-string parameters.
    suggest(index: &str, params: QueryParams) -> Vec<Value>;
    /// Suggests with a JSON body.
    suggest_with_body(index: &str, query: Value) -> Vec<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn guard_fires_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let guard: OnceCallback<Value> = OnceCallback::new(Box::new(move |err, value, _raw| {
            assert!(err.is_none());
            assert_eq!(value, Some(Value::Bool(true)));
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!guard.has_fired());
        assert!(guard.fire(None, Some(Value::Bool(true)), None));
        assert!(guard.has_fired());
        assert!(!guard.fire(Some(SearchError::missing("late")), None, None));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_deliveries_reach_the_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let guard: Arc<OnceCallback<Value>> = Arc::new(OnceCallback::new(Box::new(move |_, _, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.fire(None, None, None))
            })
            .collect();
        let delivered = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|delivered| *delivered)
            .count();

        assert_eq!(delivered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
