//! The request executor and the async call surface.
//!
//! [`SearchClient::execute`] is the single place a request is prepared,
//! dispatched through the [`SearchTransport`] and classified. Every endpoint
//! method below is a forwarder that builds an [`ApiCall`] and reshapes the
//! outcome.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, field, instrument, warn, Span};

use crate::endpoints::{self, ApiCall};
use crate::path::QueryParams;
use crate::response::classify;
use crate::{
    ClientConfig, ClientRequestId, Exchange, FromBody, PreparedRequest, SearchAction, SearchError,
    SearchTransport,
};

/// Client for one search service, generic over its transport.
///
/// Cloning is cheap; clones share the configuration and the transport.
pub struct SearchClient<T> {
    config: Arc<ClientConfig>,
    transport: Arc<T>,
}

impl<T> Clone for SearchClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for SearchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: SearchTransport> SearchClient<T> {
    /// Creates a client sending through `transport`.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    /// The configuration shared by every request.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Checks that `call` can be issued under the configured API version.
    ///
    /// ## Errors
    ///
    /// Returns an argument error when the call targets a resource the
    /// configured version does not expose.
    pub fn validate<R>(&self, call: &ApiCall<R>) -> Result<(), SearchError> {
        match call.required_feature() {
            Some(feature) if !self.config.version().supports(feature) => {
                Err(SearchError::argument(format!(
                    "{feature} require api-version {} or later (configured: {})",
                    feature.introduced_in(),
                    self.config.version()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Executes one call and returns its single outcome, raw response
    /// included.
    ///
    /// Never panics and never retries. Validation failures are returned
    /// without any request being sent.
    pub async fn execute<R: FromBody>(&self, call: ApiCall<R>) -> Exchange<R> {
        if let Err(error) = self.validate(&call) {
            return Exchange::failed(error);
        }
        let request_id = ClientRequestId::new_random();
        let prepared = call.request().prepare(&self.config, request_id);
        self.dispatch(call.operation(), request_id, prepared).await
    }

    #[instrument(
        name = "search_request",
        skip(self, prepared),
        fields(
            http.method = %prepared.method,
            http.path = %prepared.path_and_query,
            http.status_code = field::Empty,
            otel.kind = "client",
            otel.status_code = field::Empty,
        )
    )]
    async fn dispatch<R: FromBody>(
        &self,
        operation: &'static str,
        client_request_id: ClientRequestId,
        prepared: PreparedRequest,
    ) -> Exchange<R> {
        let plain_text = prepared.plain_text;
        debug!(
            payload_bytes = prepared.payload.as_ref().map_or(0, String::len),
            "sending request"
        );

        let raw = match self.transport.send(prepared).await {
            Ok(raw) => raw,
            Err(e) => {
                Span::current().record("otel.status_code", "ERROR");
                warn!(error = %e.message, "transport failure");
                return Exchange {
                    outcome: Err(SearchError::Transport {
                        message: e.message,
                        status: e.partial.as_ref().map(|r| r.status),
                    }),
                    raw: e.partial,
                };
            }
        };

        Span::current().record("http.status_code", raw.status);
        let outcome = classify(&raw, plain_text).and_then(|body| R::from_body(body, &raw));
        match &outcome {
            Ok(_) => {
                Span::current().record("otel.status_code", "OK");
                debug!("request succeeded");
            }
            Err(e) => {
                Span::current().record("otel.status_code", "ERROR");
                warn!(kind = %e.kind(), code = ?e.code(), message = %e.message(), "request failed");
            }
        }

        Exchange {
            outcome,
            raw: Some(raw),
        }
    }

    async fn value(&self, call: ApiCall<Value>) -> Result<Value, SearchError> {
        Ok(self.execute(call).await.into_result()?.unwrap_or(Value::Null))
    }

    async fn values(&self, call: ApiCall<Vec<Value>>) -> Result<Vec<Value>, SearchError> {
        Ok(self.execute(call).await.into_result()?.unwrap_or_default())
    }

    async fn unit(&self, call: ApiCall<Value>) -> Result<(), SearchError> {
        self.execute(call).await.into_result().map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Indexes
    // -----------------------------------------------------------------------

    /// Lists index definitions.
    pub async fn list_indexes(&self) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::list_indexes()?).await
    }

    /// Creates an index from `schema` and returns the created definition.
    pub async fn create_index(&self, schema: Value) -> Result<Value, SearchError> {
        self.value(endpoints::create_index(schema)?).await
    }

    /// Fetches an index definition.
    pub async fn get_index(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_index(name)?).await
    }

    /// Creates or replaces an index. Returns `Value::Null` when the service
    /// answers without a body.
    pub async fn update_index(&self, name: &str, schema: Value) -> Result<Value, SearchError> {
        self.value(endpoints::update_index(name, schema)?).await
    }

    /// Deletes an index and its documents.
    pub async fn delete_index(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::delete_index(name)?).await
    }

    /// Fetches document count and storage usage of an index.
    pub async fn get_index_stats(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_index_stats(name)?).await
    }

    /// Runs an analyzer against sample text.
    pub async fn analyze(&self, name: &str, request: Value) -> Result<Value, SearchError> {
        self.value(endpoints::analyze(name, request)?).await
    }

    // -----------------------------------------------------------------------
    // Indexers
    // -----------------------------------------------------------------------

    /// Lists indexer definitions.
    pub async fn list_indexers(&self) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::list_indexers()?).await
    }

    /// Creates an indexer.
    pub async fn create_indexer(&self, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::create_indexer(definition)?).await
    }

    /// Fetches an indexer definition.
    pub async fn get_indexer(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_indexer(name)?).await
    }

    /// Creates or replaces an indexer.
    pub async fn update_indexer(&self, name: &str, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::update_indexer(name, definition)?).await
    }

    /// Deletes an indexer.
    pub async fn delete_indexer(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::delete_indexer(name)?).await
    }

    /// Fetches the execution status of an indexer.
    pub async fn get_indexer_status(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_indexer_status(name)?).await
    }

    /// Starts an indexer run.
    pub async fn run_indexer(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::run_indexer(name)?).await
    }

    /// Resets an indexer's change-tracking state.
    pub async fn reset_indexer(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::reset_indexer(name)?).await
    }

    // -----------------------------------------------------------------------
    // Data sources, synonym maps, skillsets
    // -----------------------------------------------------------------------

    /// Lists data source definitions.
    pub async fn list_data_sources(&self) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::list_data_sources()?).await
    }

    /// Creates a data source.
    pub async fn create_data_source(&self, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::create_data_source(definition)?).await
    }

    /// Fetches a data source definition.
    pub async fn get_data_source(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_data_source(name)?).await
    }

    /// Creates or replaces a data source.
    pub async fn update_data_source(
        &self,
        name: &str,
        definition: Value,
    ) -> Result<Value, SearchError> {
        self.value(endpoints::update_data_source(name, definition)?).await
    }

    /// Deletes a data source.
    pub async fn delete_data_source(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::delete_data_source(name)?).await
    }

    /// Lists synonym maps.
    pub async fn list_synonym_maps(&self) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::list_synonym_maps()?).await
    }

    /// Creates a synonym map.
    pub async fn create_synonym_map(&self, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::create_synonym_map(definition)?).await
    }

    /// Fetches a synonym map.
    pub async fn get_synonym_map(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_synonym_map(name)?).await
    }

    /// Creates or replaces a synonym map.
    pub async fn update_synonym_map(
        &self,
        name: &str,
        definition: Value,
    ) -> Result<Value, SearchError> {
        self.value(endpoints::update_synonym_map(name, definition)?).await
    }

    /// Deletes a synonym map.
    pub async fn delete_synonym_map(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::delete_synonym_map(name)?).await
    }

    /// Lists skillsets.
    pub async fn list_skillsets(&self) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::list_skillsets()?).await
    }

    /// Creates a skillset.
    pub async fn create_skillset(&self, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::create_skillset(definition)?).await
    }

    /// Fetches a skillset.
    pub async fn get_skillset(&self, name: &str) -> Result<Value, SearchError> {
        self.value(endpoints::get_skillset(name)?).await
    }

    /// Creates or replaces a skillset.
    pub async fn update_skillset(&self, name: &str, definition: Value) -> Result<Value, SearchError> {
        self.value(endpoints::update_skillset(name, definition)?).await
    }

    /// Deletes a skillset.
    pub async fn delete_skillset(&self, name: &str) -> Result<(), SearchError> {
        self.unit(endpoints::delete_skillset(name)?).await
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Sends a batch as given (no action marker) and returns the
    /// per-document results.
    pub async fn add_documents(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::add_documents(index, documents)?).await
    }

    /// Uploads documents, replacing existing ones.
    pub async fn upload_documents(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::upload_documents(index, documents)?).await
    }

    /// Merges fields into existing documents.
    pub async fn merge_documents(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::merge_documents(index, documents)?).await
    }

    /// Merges into existing documents, uploading those that do not exist.
    pub async fn merge_or_upload_documents(
        &self,
        index: &str,
        documents: Vec<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::merge_or_upload_documents(index, documents)?)
            .await
    }

    /// Deletes the documents identified by `keys`.
    pub async fn delete_documents(
        &self,
        index: &str,
        keys: Vec<Value>,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::delete_documents(index, keys)?).await
    }

    /// Sends a batch with every document stamped with `action`.
    pub async fn index_documents(
        &self,
        index: &str,
        documents: Vec<Value>,
        action: SearchAction,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::index_documents(index, documents, action)?)
            .await
    }

    /// Runs a search and returns the matching documents.
    pub async fn search(&self, index: &str, query: Value) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::search(index, query)?).await
    }

    /// Fetches one document by key.
    pub async fn lookup(&self, index: &str, key: &str) -> Result<Value, SearchError> {
        self.value(endpoints::lookup(index, key)?).await
    }

    /// Returns the number of documents in an index.
    pub async fn count(&self, index: &str) -> Result<u64, SearchError> {
        let exchange = self.execute(endpoints::count(index)?).await;
        // FromBody for u64 never yields Ok(None).
        Ok(exchange.into_result()?.unwrap_or_default())
    }

    /// Returns suggestions for the parameters given in `params`.
    pub async fn suggest(&self, index: &str, params: QueryParams) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::suggest(index, params)?).await
    }

    /// Returns suggestions, sending the parameters as a JSON body.
    pub async fn suggest_with_body(
        &self,
        index: &str,
        query: Value,
    ) -> Result<Vec<Value>, SearchError> {
        self.values(endpoints::suggest_with_body(index, query)?).await
    }
}
