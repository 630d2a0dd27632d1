//! Endpoint descriptors.
//!
//! Each function here validates its arguments and returns an [`ApiCall`]: the
//! verb, path and body of one REST operation together with the type its
//! response is reshaped into. Nothing here performs I/O, so argument errors
//! surface before a request exists.
//!
//! Both call surfaces (async [`SearchClient`](crate::SearchClient) methods and
//! the callback client in `search-http`) are thin forwarders over these
//! functions.

use std::marker::PhantomData;

use serde_json::{json, Value};

use crate::path::QueryParams;
use crate::request::ApiRequest;
use crate::{
    DataSourceName, DocumentKey, IndexName, IndexerName, Method, SearchAction, SearchError,
    ServiceFeature, SkillsetName, SynonymMapName, ACTION_FIELD,
};

/// One REST operation, ready to execute.
///
/// `T` is the type the success body is reshaped into (see
/// [`FromBody`](crate::FromBody)).
#[derive(Debug, Clone)]
pub struct ApiCall<T> {
    operation: &'static str,
    request: ApiRequest,
    requires: Option<ServiceFeature>,
    output: PhantomData<fn() -> T>,
}

impl<T> ApiCall<T> {
    /// Wraps an arbitrary request. `operation` names the call in log events.
    pub fn new(operation: &'static str, request: ApiRequest) -> Self {
        Self {
            operation,
            request,
            requires: None,
            output: PhantomData,
        }
    }

    fn requiring(mut self, feature: ServiceFeature) -> Self {
        self.requires = Some(feature);
        self
    }

    /// The operation name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The request to send.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// The feature the configured API version must support, if any.
    pub fn required_feature(&self) -> Option<ServiceFeature> {
        self.requires
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn required_body(body: Value, what: &str) -> Result<Value, SearchError> {
    match &body {
        Value::Null => Err(SearchError::missing(what)),
        Value::Object(map) if map.is_empty() => Err(SearchError::missing(what)),
        Value::String(s) if s.is_empty() => Err(SearchError::missing(what)),
        _ => Ok(body),
    }
}

fn batch(documents: Vec<Value>, what: &str, action: Option<SearchAction>) -> Result<Value, SearchError> {
    if documents.is_empty() {
        return Err(SearchError::missing(what));
    }
    let mut stamped = Vec::with_capacity(documents.len());
    for (i, document) in documents.into_iter().enumerate() {
        let Value::Object(mut fields) = document else {
            return Err(SearchError::argument(format!(
                "{what}[{i}] is not a JSON object"
            )));
        };
        if let Some(action) = action {
            fields.insert(ACTION_FIELD.into(), Value::String(action.to_string()));
        }
        stamped.push(Value::Object(fields));
    }
    Ok(json!({ "value": stamped }))
}

// ---------------------------------------------------------------------------
// Named resource collections
// ---------------------------------------------------------------------------

/// Generates list/create/get/update/delete descriptors for one collection.
macro_rules! collection_endpoints {
    (
        $collection:literal, $id:ident, $what:literal, $feature:expr,
        $list:ident, $create:ident, $get:ident, $update:ident, $delete:ident
    ) => {
        #[doc = concat!("`GET /", $collection, "`: the `value` array of the listing.")]
        pub fn $list() -> Result<ApiCall<Vec<Value>>, SearchError> {
            let call = ApiCall::new(stringify!($list), ApiRequest::new(Method::Get, [$collection]));
            Ok(gate(call, $feature))
        }

        #[doc = concat!("`POST /", $collection, "`: creates a resource from its definition.")]
        pub fn $create(definition: Value) -> Result<ApiCall<Value>, SearchError> {
            let body = required_body(definition, $what)?;
            let call = ApiCall::new(
                stringify!($create),
                ApiRequest::new(Method::Post, [$collection]).body(body),
            );
            Ok(gate(call, $feature))
        }

        #[doc = concat!("`GET /", $collection, "/{name}`.")]
        pub fn $get(name: &str) -> Result<ApiCall<Value>, SearchError> {
            let name = $id::try_new(name)?;
            let call = ApiCall::new(
                stringify!($get),
                ApiRequest::new(Method::Get, [$collection.to_string(), name.to_string()]),
            );
            Ok(gate(call, $feature))
        }

        #[doc = concat!("`PUT /", $collection, "/{name}`: creates or replaces a resource.")]
        pub fn $update(name: &str, definition: Value) -> Result<ApiCall<Value>, SearchError> {
            let name = $id::try_new(name)?;
            let body = required_body(definition, $what)?;
            let call = ApiCall::new(
                stringify!($update),
                ApiRequest::new(Method::Put, [$collection.to_string(), name.to_string()]).body(body),
            );
            Ok(gate(call, $feature))
        }

        #[doc = concat!("`DELETE /", $collection, "/{name}`.")]
        pub fn $delete(name: &str) -> Result<ApiCall<Value>, SearchError> {
            let name = $id::try_new(name)?;
            let call = ApiCall::new(
                stringify!($delete),
                ApiRequest::new(Method::Delete, [$collection.to_string(), name.to_string()]),
            );
            Ok(gate(call, $feature))
        }
    };
}

fn gate<T>(call: ApiCall<T>, feature: Option<ServiceFeature>) -> ApiCall<T> {
    match feature {
        Some(feature) => call.requiring(feature),
        None => call,
    }
}

collection_endpoints!(
    "indexes", IndexName, "schema", None,
    list_indexes, create_index, get_index, update_index, delete_index
);

collection_endpoints!(
    "indexers", IndexerName, "schema", None,
    list_indexers, create_indexer, get_indexer, update_indexer, delete_indexer
);

collection_endpoints!(
    "datasources", DataSourceName, "options", None,
    list_data_sources, create_data_source, get_data_source, update_data_source, delete_data_source
);

collection_endpoints!(
    "synonymmaps", SynonymMapName, "synonymMap", Some(ServiceFeature::SynonymMaps),
    list_synonym_maps, create_synonym_map, get_synonym_map, update_synonym_map, delete_synonym_map
);

collection_endpoints!(
    "skillsets", SkillsetName, "skillset", Some(ServiceFeature::Skillsets),
    list_skillsets, create_skillset, get_skillset, update_skillset, delete_skillset
);

// ---------------------------------------------------------------------------
// Index sub-resources
// ---------------------------------------------------------------------------

/// `GET /indexes/{name}/stats`: document count and storage size.
pub fn get_index_stats(index: &str) -> Result<ApiCall<Value>, SearchError> {
    let index = IndexName::try_new(index)?;
    Ok(ApiCall::new(
        "get_index_stats",
        ApiRequest::new(Method::Get, ["indexes".to_string(), index.to_string(), "stats".into()]),
    ))
}

/// `POST /indexes/{name}/analyze`: runs an analyzer over sample text.
pub fn analyze(index: &str, request: Value) -> Result<ApiCall<Value>, SearchError> {
    let index = IndexName::try_new(index)?;
    let body = required_body(request, "analyzeRequest")?;
    Ok(ApiCall::new(
        "analyze",
        ApiRequest::new(Method::Post, ["indexes".to_string(), index.to_string(), "analyze".into()])
            .body(body),
    ))
}

// ---------------------------------------------------------------------------
// Indexer actions
// ---------------------------------------------------------------------------

fn indexer_call(
    operation: &'static str,
    method: Method,
    indexer: &str,
    action: &str,
) -> Result<ApiCall<Value>, SearchError> {
    let indexer = IndexerName::try_new(indexer)?;
    Ok(ApiCall::new(
        operation,
        ApiRequest::new(method, ["indexers".to_string(), indexer.to_string(), action.to_string()]),
    ))
}

/// `GET /indexers/{name}/status`: execution history and current state.
pub fn get_indexer_status(indexer: &str) -> Result<ApiCall<Value>, SearchError> {
    indexer_call("get_indexer_status", Method::Get, indexer, "status")
}

/// `POST /indexers/{name}/run`: starts an on-demand run.
pub fn run_indexer(indexer: &str) -> Result<ApiCall<Value>, SearchError> {
    indexer_call("run_indexer", Method::Post, indexer, "run")
}

/// `POST /indexers/{name}/reset`: clears change-tracking state.
pub fn reset_indexer(indexer: &str) -> Result<ApiCall<Value>, SearchError> {
    indexer_call("reset_indexer", Method::Post, indexer, "reset")
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

fn docs_path(index: &IndexName, tail: &str) -> [String; 4] {
    ["indexes".into(), index.to_string(), "docs".into(), tail.into()]
}

fn index_batch(
    operation: &'static str,
    index: &str,
    documents: Vec<Value>,
    what: &str,
    action: Option<SearchAction>,
) -> Result<ApiCall<Vec<Value>>, SearchError> {
    let index = IndexName::try_new(index)?;
    let body = batch(documents, what, action)?;
    Ok(ApiCall::new(
        operation,
        ApiRequest::new(Method::Post, docs_path(&index, "index")).body(body),
    ))
}

/// `POST /indexes/{name}/docs/index` with the documents as given.
///
/// No action marker is added; documents without one are uploaded by the
/// service. The result is the per-document status list.
pub fn add_documents(index: &str, documents: Vec<Value>) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch("add_documents", index, documents, "documents", None)
}

/// Index batch with every document marked `upload`.
pub fn upload_documents(
    index: &str,
    documents: Vec<Value>,
) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch("upload_documents", index, documents, "documents", Some(SearchAction::Upload))
}

/// Index batch with every document marked `merge`.
pub fn merge_documents(
    index: &str,
    documents: Vec<Value>,
) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch("merge_documents", index, documents, "documents", Some(SearchAction::Merge))
}

/// Index batch with every document marked `mergeOrUpload`.
pub fn merge_or_upload_documents(
    index: &str,
    documents: Vec<Value>,
) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch(
        "merge_or_upload_documents",
        index,
        documents,
        "documents",
        Some(SearchAction::MergeOrUpload),
    )
}

/// Index batch with every key document marked `delete`.
pub fn delete_documents(index: &str, keys: Vec<Value>) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch("delete_documents", index, keys, "keys", Some(SearchAction::Delete))
}

/// Index batch where every document is stamped with `action`.
pub fn index_documents(
    index: &str,
    documents: Vec<Value>,
    action: SearchAction,
) -> Result<ApiCall<Vec<Value>>, SearchError> {
    index_batch("index_documents", index, documents, "documents", Some(action))
}

/// `POST /indexes/{name}/docs/search`: the `value` array of matching
/// documents. Facets and counts stay available in the raw response.
pub fn search(index: &str, query: Value) -> Result<ApiCall<Vec<Value>>, SearchError> {
    let index = IndexName::try_new(index)?;
    let body = required_body(query, "query")?;
    Ok(ApiCall::new(
        "search",
        ApiRequest::new(Method::Post, docs_path(&index, "search")).body(body),
    ))
}

/// `GET /indexes/{name}/docs('{key}')`: one document by key.
pub fn lookup(index: &str, key: &str) -> Result<ApiCall<Value>, SearchError> {
    let index = IndexName::try_new(index)?;
    let key = DocumentKey::try_new(key)?;
    Ok(ApiCall::new(
        "lookup",
        ApiRequest::new(
            Method::Get,
            ["indexes".to_string(), index.to_string(), format!("docs('{key}')")],
        ),
    ))
}

/// `GET /indexes/{name}/docs/$count` as plain text.
pub fn count(index: &str) -> Result<ApiCall<u64>, SearchError> {
    let index = IndexName::try_new(index)?;
    Ok(ApiCall::new(
        "count",
        ApiRequest::new(Method::Get, docs_path(&index, "$count")).accept_plain_text(),
    ))
}

/// `GET /indexes/{name}/docs/suggest` with the suggestion parameters in the
/// query string (`search`, `suggesterName`, ...).
pub fn suggest(index: &str, params: QueryParams) -> Result<ApiCall<Vec<Value>>, SearchError> {
    let index = IndexName::try_new(index)?;
    if params.is_empty() {
        return Err(SearchError::missing("query"));
    }
    Ok(ApiCall::new(
        "suggest",
        ApiRequest::new(Method::Get, docs_path(&index, "suggest")).query(params),
    ))
}

/// `POST /indexes/{name}/docs/suggest` with the parameters as a JSON body.
pub fn suggest_with_body(index: &str, query: Value) -> Result<ApiCall<Vec<Value>>, SearchError> {
    let index = IndexName::try_new(index)?;
    let body = required_body(query, "query")?;
    Ok(ApiCall::new(
        "suggest",
        ApiRequest::new(Method::Post, docs_path(&index, "suggest")).body(body),
    ))
}
