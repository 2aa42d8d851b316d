//! Demo server: an in-memory `articles` / `articles.comments` API served
//! through the dispatch adapter.
//!
//! ```sh
//! demo-server --port 3000 --xhr-path /api
//! curl localhost:3000/api/articles
//! curl -X POST localhost:3000/api/articles -d '{"title":"hello"}'
//! curl localhost:3000/api/articles/1/comments
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use http::StatusCode;
use isopropyl_dispatch::network::{NetworkConfig, NetworkModule};
use isopropyl_dispatch::telemetry::{init_tracing, LogFormat};
use isopropyl_dispatch::{
    Handler, HandlerSet, IsopropylConfig, Registry, Request, StatusError,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tracing::info;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "demo-server")]
#[command(about = "Serves an in-memory articles API through the dispatch adapter")]
struct Args {
    /// Bind address for the HTTP server.
    #[arg(long, default_value = "0.0.0.0", env = "ISOPROPYL_HOST")]
    host: String,

    /// HTTP port to listen on. 0 picks a free port.
    #[arg(short, long, default_value_t = 3000, env = "ISOPROPYL_PORT")]
    port: u16,

    /// Transport path prefix stripped from inbound paths.
    #[arg(long, default_value = "/api", env = "ISOPROPYL_XHR_PATH")]
    xhr_path: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "ISOPROPYL_LOG_FORMAT")]
    log_format: LogFormat,
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Store {
    next_id: AtomicU64,
    articles: RwLock<BTreeMap<u64, Value>>,
    comments: RwLock<BTreeMap<u64, Vec<Value>>>,
}

impl Store {
    fn insert(&self, mut article: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(fields) = article.as_object_mut() {
            fields.insert("id".to_string(), json!(id));
        }
        self.articles.write().insert(id, article.clone());
        article
    }
}

fn article_id(request: &Request) -> Result<u64> {
    let raw = request
        .params
        .get("articles")
        .context("missing article id")?;
    raw.parse()
        .map_err(|_| StatusError::new(StatusCode::BAD_REQUEST, format!("invalid article id {raw}")).into())
}

fn not_found(id: u64) -> anyhow::Error {
    StatusError::new(StatusCode::NOT_FOUND, format!("article {id} does not exist")).into()
}

/// One handler per calling convention, to exercise each of them.
fn article_handlers(store: &Arc<Store>) -> HandlerSet {
    let list = Arc::clone(store);
    let fetch = Arc::clone(store);
    let create = Arc::clone(store);
    let replace = Arc::clone(store);
    let remove = Arc::clone(store);

    HandlerSet::new()
        .get(Handler::sync(move |_| {
            Ok(Value::Array(list.articles.read().values().cloned().collect()))
        }))
        .get_one(Handler::eventual(move |request| {
            let store = Arc::clone(&fetch);
            async move {
                let id = article_id(&request)?;
                store.articles.read().get(&id).cloned().ok_or_else(|| not_found(id))
            }
        }))
        .post(Handler::callback(move |request, callback| {
            let store = Arc::clone(&create);
            tokio::spawn(async move {
                callback.resolve(store.insert(request.body));
            });
        }))
        .put_one(Handler::sync(move |request| {
            let id = article_id(&request)?;
            let mut articles = replace.articles.write();
            let slot = articles.get_mut(&id).ok_or_else(|| not_found(id))?;
            let mut article = request.body;
            if let Some(fields) = article.as_object_mut() {
                fields.insert("id".to_string(), json!(id));
            }
            *slot = article.clone();
            Ok(article)
        }))
        .delete_one(Handler::sync(move |request| {
            let id = article_id(&request)?;
            remove.articles.write().remove(&id).ok_or_else(|| not_found(id))
        }))
}

fn comment_handlers(store: &Arc<Store>) -> HandlerSet {
    let list = Arc::clone(store);
    let create = Arc::clone(store);

    HandlerSet::new()
        .get(Handler::sync(move |request| {
            let id = article_id(&request)?;
            let comments = list.comments.read();
            Ok(json!(comments.get(&id).cloned().unwrap_or_default()))
        }))
        .post(Handler::sync(move |request| {
            let id = article_id(&request)?;
            if !create.articles.read().contains_key(&id) {
                return Err(not_found(id));
            }
            create
                .comments
                .write()
                .entry(id)
                .or_default()
                .push(request.body.clone());
            Ok(request.body)
        }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let store = Arc::new(Store::default());
    store.insert(json!({"title": "Hello from the server"}));

    let mut builder = Registry::builder(IsopropylConfig {
        xhr_path: args.xhr_path.clone(),
        ..IsopropylConfig::default()
    });
    builder
        .register("articles", article_handlers(&store))?
        .register("articles.comments", comment_handlers(&store))?;
    let registry = builder.build()?;

    // the descriptor path runs the same handlers the HTTP adapter reaches
    let seeded = registry.collection("articles")?.get(Default::default()).await?;
    info!(articles = %seeded, "registry ready");

    let mut module = NetworkModule::new(
        NetworkConfig {
            host: args.host,
            port: args.port,
            ..NetworkConfig::default()
        },
        registry,
    );
    let port = module.start().await?;
    info!(port, xhr_path = %args.xhr_path, "demo server listening");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
