//! Subcommands and their execution against the async client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde_json::Value;

use search::{QueryParams, SearchAction};
use search_http::HttpSearchClient;

/// A named resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    #[value(alias = "index")]
    Indexes,
    #[value(alias = "indexer")]
    Indexers,
    #[value(alias = "datasource")]
    Datasources,
    #[value(alias = "synonymmap")]
    Synonymmaps,
    #[value(alias = "skillset")]
    Skillsets,
}

/// Action stamped on every document of an index batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Upload,
    Merge,
    MergeOrUpload,
    Delete,
}

impl From<ActionArg> for SearchAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Upload => SearchAction::Upload,
            ActionArg::Merge => SearchAction::Merge,
            ActionArg::MergeOrUpload => SearchAction::MergeOrUpload,
            ActionArg::Delete => SearchAction::Delete,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every resource of a kind
    List { kind: Kind },

    /// Show one resource definition
    Get { kind: Kind, name: String },

    /// Delete one resource
    Delete { kind: Kind, name: String },

    /// Create a resource from a JSON definition file
    Create {
        kind: Kind,
        #[arg(value_name = "FILE")]
        definition: PathBuf,
    },

    /// Create or replace a named resource from a JSON definition file
    Update {
        kind: Kind,
        name: String,
        #[arg(value_name = "FILE")]
        definition: PathBuf,
    },

    /// Show document count and storage usage of an index
    Stats { index: String },

    /// Show the execution history of an indexer
    IndexerStatus { name: String },

    /// Start an indexer run
    IndexerRun { name: String },

    /// Reset an indexer's change tracking
    IndexerReset { name: String },

    /// Count the documents in an index
    Count { index: String },

    /// Fetch one document by key
    Lookup {
        index: String,
        #[arg(value_name = "KEY")]
        document_key: String,
    },

    /// Search an index
    Search {
        index: String,
        /// Inline JSON query, or a path to a file holding one
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Suggest documents for partial input
    Suggest {
        index: String,
        #[arg(long)]
        search: String,
        #[arg(long)]
        suggester: String,
        /// Maximum number of suggestions
        #[arg(long)]
        top: Option<u64>,
    },

    /// Send a batch of documents from a JSON array file
    IndexDocs {
        index: String,
        #[arg(value_name = "FILE")]
        documents: PathBuf,
        #[arg(long, value_enum, default_value_t = ActionArg::Upload)]
        action: ActionArg,
    },
}

impl Command {
    /// Short name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Get { .. } => "get",
            Self::Delete { .. } => "delete",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Stats { .. } => "stats",
            Self::IndexerStatus { .. } => "indexer-status",
            Self::IndexerRun { .. } => "indexer-run",
            Self::IndexerReset { .. } => "indexer-reset",
            Self::Count { .. } => "count",
            Self::Lookup { .. } => "lookup",
            Self::Search { .. } => "search",
            Self::Suggest { .. } => "suggest",
            Self::IndexDocs { .. } => "index-docs",
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_documents(path: &Path) -> Result<Vec<Value>> {
    match read_json(path)? {
        Value::Array(documents) => Ok(documents),
        // Accept the wire shape too.
        Value::Object(mut batch) => match batch.remove("value") {
            Some(Value::Array(documents)) => Ok(documents),
            _ => anyhow::bail!("{} must hold a JSON array of documents", path.display()),
        },
        _ => anyhow::bail!("{} must hold a JSON array of documents", path.display()),
    }
}

/// Inline JSON wins; anything that does not parse is treated as a path.
fn inline_or_file(arg: &str) -> Result<Value> {
    match serde_json::from_str(arg) {
        Ok(value) => Ok(value),
        Err(_) => read_json(Path::new(arg)),
    }
}

/// Runs one command. `None` means the operation succeeded with nothing to
/// print.
pub async fn execute(client: &HttpSearchClient, command: Command) -> Result<Option<Value>> {
    let output = match command {
        Command::List { kind } => {
            let items = match kind {
                Kind::Indexes => client.list_indexes().await?,
                Kind::Indexers => client.list_indexers().await?,
                Kind::Datasources => client.list_data_sources().await?,
                Kind::Synonymmaps => client.list_synonym_maps().await?,
                Kind::Skillsets => client.list_skillsets().await?,
            };
            Some(Value::Array(items))
        }
        Command::Get { kind, name } => Some(match kind {
            Kind::Indexes => client.get_index(&name).await?,
            Kind::Indexers => client.get_indexer(&name).await?,
            Kind::Datasources => client.get_data_source(&name).await?,
            Kind::Synonymmaps => client.get_synonym_map(&name).await?,
            Kind::Skillsets => client.get_skillset(&name).await?,
        }),
        Command::Delete { kind, name } => {
            match kind {
                Kind::Indexes => client.delete_index(&name).await?,
                Kind::Indexers => client.delete_indexer(&name).await?,
                Kind::Datasources => client.delete_data_source(&name).await?,
                Kind::Synonymmaps => client.delete_synonym_map(&name).await?,
                Kind::Skillsets => client.delete_skillset(&name).await?,
            }
            None
        }
        Command::Create { kind, definition } => {
            let definition = read_json(&definition)?;
            Some(match kind {
                Kind::Indexes => client.create_index(definition).await?,
                Kind::Indexers => client.create_indexer(definition).await?,
                Kind::Datasources => client.create_data_source(definition).await?,
                Kind::Synonymmaps => client.create_synonym_map(definition).await?,
                Kind::Skillsets => client.create_skillset(definition).await?,
            })
        }
        Command::Update {
            kind,
            name,
            definition,
        } => {
            let definition = read_json(&definition)?;
            Some(match kind {
                Kind::Indexes => client.update_index(&name, definition).await?,
                Kind::Indexers => client.update_indexer(&name, definition).await?,
                Kind::Datasources => client.update_data_source(&name, definition).await?,
                Kind::Synonymmaps => client.update_synonym_map(&name, definition).await?,
                Kind::Skillsets => client.update_skillset(&name, definition).await?,
            })
        }
        Command::Stats { index } => Some(client.get_index_stats(&index).await?),
        Command::IndexerStatus { name } => Some(client.get_indexer_status(&name).await?),
        Command::IndexerRun { name } => {
            client.run_indexer(&name).await?;
            None
        }
        Command::IndexerReset { name } => {
            client.reset_indexer(&name).await?;
            None
        }
        Command::Count { index } => Some(Value::from(client.count(&index).await?)),
        Command::Lookup {
            index,
            document_key,
        } => Some(client.lookup(&index, &document_key).await?),
        Command::Search { index, query } => {
            let query = inline_or_file(&query)?;
            Some(Value::Array(client.search(&index, query).await?))
        }
        Command::Suggest {
            index,
            search,
            suggester,
            top,
        } => {
            let mut params = QueryParams::new()
                .with("search", search)
                .with("suggesterName", suggester);
            if let Some(top) = top {
                params.insert("$top", top);
            }
            Some(Value::Array(client.suggest(&index, params).await?))
        }
        Command::IndexDocs {
            index,
            documents,
            action,
        } => {
            let documents = read_documents(&documents)?;
            Some(Value::Array(
                client
                    .index_documents(&index, documents, action.into())
                    .await?,
            ))
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_json(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("searchctl-{}-{name}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn action_arg_maps_to_search_action() {
        assert_eq!(SearchAction::from(ActionArg::MergeOrUpload), SearchAction::MergeOrUpload);
        assert_eq!(SearchAction::from(ActionArg::Delete), SearchAction::Delete);
    }

    #[test]
    fn inline_query_is_parsed_directly() {
        let query = inline_or_file(r#"{"search":"*","top":5}"#).unwrap();
        assert_eq!(query["top"], 5);
    }

    #[test]
    fn query_falls_back_to_file() {
        let path = temp_json("query.json", r#"{"search":"lake"}"#);
        let query = inline_or_file(path.to_str().unwrap()).unwrap();
        assert_eq!(query["search"], "lake");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn documents_accept_array_or_batch_shape() {
        let array = temp_json("array.json", r#"[{"id":"1"},{"id":"2"}]"#);
        assert_eq!(read_documents(&array).unwrap().len(), 2);
        std::fs::remove_file(array).unwrap();

        let batch = temp_json("batch.json", r#"{"value":[{"id":"1"}]}"#);
        assert_eq!(read_documents(&batch).unwrap().len(), 1);
        std::fs::remove_file(batch).unwrap();

        let scalar = temp_json("scalar.json", "42");
        assert!(read_documents(&scalar).is_err());
        std::fs::remove_file(scalar).unwrap();
    }
}
