//! mnemo CLI — operator interface to the memory store.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use mnemo_rs::config::Config;
use mnemo_rs::graph::BoltGraph;
use mnemo_rs::model::{
    Metadata, MemoryRelation, NewRecord, QueryOptions, RecordFields, RecordKind, RecordPatch,
    RelationKind, SearchCriteria, SortDirection,
};
use mnemo_rs::store::MemoryStore;
use mnemo_rs::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;

#[derive(Parser)]
#[command(name = "mnemo", about = "Graph-backed memory record store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the per-kind id indexes (idempotent)
    Init,
    /// Create a record
    Create {
        /// Record kind (Conversation, Topic, Project, Task, Issue, Config, Finance, Todo)
        kind: RecordKind,
        /// Free-text body
        content: String,
        /// Title, kept on any kind
        #[arg(long)]
        title: Option<String>,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
        /// Kind-specific fields as a JSON object (e.g. '{"status":"open"}')
        #[arg(long)]
        fields: Option<String>,
    },
    /// Fetch a record by id
    Get {
        id: String,
    },
    /// Search records
    Search {
        #[arg(long)]
        kind: Option<RecordKind>,
        #[arg(long)]
        keyword: Option<String>,
        /// Inclusive lower bound on created (epoch ms)
        #[arg(long)]
        after: Option<i64>,
        /// Inclusive upper bound on created (epoch ms)
        #[arg(long)]
        before: Option<i64>,
        /// Metadata filters as a JSON object
        #[arg(long)]
        metadata: Option<String>,
        /// Whole-phrase matching instead of fuzzy per-term matching
        #[arg(long)]
        exact: bool,
        /// Keep only the N most relevant results
        #[arg(long)]
        top: Option<i64>,
        #[arg(long)]
        order_by: Option<String>,
        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Update a record's content, metadata, or fields
    Update {
        id: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
        #[arg(long)]
        fields: Option<String>,
    },
    /// Delete a record and all its relations
    Delete {
        id: String,
    },
    /// Relate two records with a typed edge
    Relate {
        from: String,
        to: String,
        /// Relation type (CONTAINS, RELATED_TO, DEPENDS_ON, PART_OF,
        /// RESOLVED_BY, CREATED_AT, UPDATED_AT)
        kind: RelationKind,
        /// Edge properties as a JSON object
        #[arg(long)]
        properties: Option<String>,
    },
    /// List records related from the given id
    Related {
        id: String,
        #[arg(long)]
        kind: Option<RelationKind>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "mnemo".to_string(),
    })?;

    let graph = BoltGraph::connect(
        &config.neo4j_uri,
        &config.neo4j_user,
        config.neo4j_password.expose_secret(),
    )
    .await?;
    let store = MemoryStore::new(Arc::new(graph));

    match cli.command {
        Command::Init => {
            store.initialize().await?;
            println!("indexes ready");
        }
        Command::Create {
            kind,
            content,
            title,
            metadata,
            fields,
        } => {
            let mut new = NewRecord::new(kind, content);
            if let Some(title) = title {
                new = new.title(title);
            }
            if let Some(raw) = metadata {
                new = new.metadata(parse_object(&raw)?);
            }
            if let Some(raw) = fields {
                new = new.fields(serde_json::from_str::<RecordFields>(&raw)?);
            }
            let record = store.create(new).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Get { id } => match store.fetch_by_id(&id).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("not found: {id}"),
        },
        Command::Search {
            kind,
            keyword,
            after,
            before,
            metadata,
            exact,
            top,
            order_by,
            asc,
            limit,
            offset,
        } => {
            let mut criteria = SearchCriteria::new()
                .created_between(after, before)
                .fuzzy(!exact);
            if let Some(kind) = kind {
                criteria = criteria.kind(kind);
            }
            if let Some(keyword) = keyword {
                criteria = criteria.keyword(keyword);
            }
            if let Some(raw) = metadata {
                criteria = criteria.metadata(parse_object(&raw)?);
            }
            if let Some(top) = top {
                criteria = criteria.top_n(top);
            }

            let options = QueryOptions {
                order_by,
                direction: if asc {
                    SortDirection::Asc
                } else {
                    SortDirection::Desc
                },
                limit,
                offset,
            };

            let records = store.search(&criteria, &options).await?;
            if records.is_empty() {
                println!("no records found");
            } else {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
        Command::Update {
            id,
            content,
            metadata,
            fields,
        } => {
            let mut patch = RecordPatch::new();
            if let Some(content) = content {
                patch = patch.content(content);
            }
            if let Some(raw) = metadata {
                patch = patch.metadata(parse_object(&raw)?);
            }
            if let Some(raw) = fields {
                patch = patch.fields(serde_json::from_str::<RecordFields>(&raw)?);
            }
            match store.update(&id, patch).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("not found: {id}"),
            }
        }
        Command::Delete { id } => {
            if store.delete(&id).await? {
                println!("deleted: {id}");
            } else {
                println!("not found: {id}");
            }
        }
        Command::Relate {
            from,
            to,
            kind,
            properties,
        } => {
            let mut relation = MemoryRelation::new(from, to, kind);
            if let Some(raw) = properties {
                relation = relation.properties(parse_object(&raw)?);
            }
            store.create_relation(&relation).await?;
            println!("ok");
        }
        Command::Related { id, kind } => {
            let records = store.related_from(&id, kind).await?;
            if records.is_empty() {
                println!("no related records");
            } else {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        }
    }

    Ok(())
}

fn parse_object(raw: &str) -> anyhow::Result<Metadata> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("expected a JSON object: {e}"))
}
