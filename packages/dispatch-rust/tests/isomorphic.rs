//! The same descriptor calls, answered in-process on the server and over HTTP
//! on a client that registers nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use http::StatusCode;
use isopropyl_dispatch::network::{NetworkConfig, NetworkModule};
use isopropyl_dispatch::{
    DispatchError, Handler, HandlerSet, IsopropylConfig, Query, Registry, StatusError,
    TransportConfig, TransportError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

fn server_registry() -> Registry {
    let articles: Arc<Mutex<BTreeMap<String, Value>>> = Arc::new(Mutex::new(BTreeMap::new()));
    articles
        .lock()
        .insert("1".to_string(), json!({"id": "1", "title": "first"}));

    let list = Arc::clone(&articles);
    let fetch = Arc::clone(&articles);
    let create = Arc::clone(&articles);

    let mut builder = Registry::builder(IsopropylConfig::default());
    builder
        .register(
            "articles",
            HandlerSet::new()
                .get(Handler::sync(move |req| {
                    let mut all: Vec<Value> = list.lock().values().cloned().collect();
                    if let Some(limit) = req.query.get("limit").and_then(|l| l.parse().ok()) {
                        all.truncate(limit);
                    }
                    Ok(Value::Array(all))
                }))
                .get_one(Handler::eventual(move |req| {
                    let found = fetch.lock().get(&req.params["articles"]).cloned();
                    async move {
                        found.ok_or_else(|| {
                            anyhow::Error::new(StatusError::new(
                                StatusCode::NOT_FOUND,
                                "no such article",
                            ))
                        })
                    }
                }))
                .post(Handler::callback(move |req, callback| {
                    let mut articles = create.lock();
                    let id = (articles.len() + 1).to_string();
                    let mut article = req.body;
                    article["id"] = json!(id);
                    articles.insert(id, article.clone());
                    callback.resolve(article);
                })),
        )
        .unwrap()
        .register(
            "articles.comments",
            HandlerSet::new().get(Handler::sync(|req| {
                Ok(json!([{"article": req.params["articles"], "text": "nice"}]))
            })),
        )
        .unwrap();
    builder.build().unwrap()
}

struct Harness {
    server: Registry,
    client: Registry,
    stop: Option<oneshot::Sender<()>>,
    served: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    async fn start() -> Self {
        let server = server_registry();

        let mut module = NetworkModule::new(
            NetworkConfig {
                host: "127.0.0.1".to_string(),
                ..NetworkConfig::default()
            },
            server.clone(),
        );
        let port = module.start().await.unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let served = tokio::spawn(module.serve(async move {
            let _ = stopped.await;
        }));

        let client = Registry::builder(IsopropylConfig {
            transport: TransportConfig {
                base_url: Some(format!("http://127.0.0.1:{port}")),
                ..TransportConfig::default()
            },
            ..IsopropylConfig::default()
        })
        .build()
        .unwrap();

        Self {
            server,
            client,
            stop: Some(stop),
            served,
        }
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.served.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn member_get_matches_across_the_wire() {
    let harness = Harness::start().await;

    let local = harness.server.resource("articles", [1]).unwrap();
    let remote = harness.client.resource("articles", [1]).unwrap();
    assert!(local.is_locally_defined());
    assert!(!remote.is_locally_defined());
    assert_eq!(local.uri(), remote.uri());

    let local_value = local.get(Query::new()).await.unwrap();
    let remote_value = remote.get(Query::new()).await.unwrap();
    assert_eq!(local_value, json!({"id": "1", "title": "first"}));
    assert_eq!(remote_value, local_value);

    harness.shutdown().await;
}

#[tokio::test]
async fn query_and_nested_params_cross_the_wire() {
    let harness = Harness::start().await;

    let mut query = Query::new();
    query.insert("limit".into(), "1".into());
    let listed = harness
        .client
        .collection("articles")
        .unwrap()
        .get(query)
        .await
        .unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let comments = harness
        .client
        .resource("articles.comments", ["1"])
        .unwrap()
        .get(Query::new())
        .await
        .unwrap();
    assert_eq!(comments, json!([{"article": "1", "text": "nice"}]));

    harness.shutdown().await;
}

#[tokio::test]
async fn ids_needing_escapes_bind_identically() {
    let harness = Harness::start().await;

    for id in ["hello world", "café", "a/b?c#d", "100%"] {
        let local = harness
            .server
            .resource("articles.comments", [id])
            .unwrap()
            .get(Query::new())
            .await
            .unwrap();
        let remote = harness
            .client
            .resource("articles.comments", [id])
            .unwrap()
            .get(Query::new())
            .await
            .unwrap();
        assert_eq!(local, json!([{"article": id, "text": "nice"}]));
        assert_eq!(remote, local, "id {id:?}");
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn remote_post_reaches_callback_handler() {
    let harness = Harness::start().await;

    let created = harness
        .client
        .collection("articles")
        .unwrap()
        .post(json!({"title": "second"}), Query::new())
        .await
        .unwrap();
    assert_eq!(created, json!({"id": "2", "title": "second"}));

    // visible through the server's own descriptor
    let stored = harness
        .server
        .resource("articles", [2])
        .unwrap()
        .get(Query::new())
        .await
        .unwrap();
    assert_eq!(stored, created);

    harness.shutdown().await;
}

#[tokio::test]
async fn remote_errors_carry_status() {
    let harness = Harness::start().await;

    let missing = harness
        .client
        .resource("articles", [99])
        .unwrap()
        .get(Query::new())
        .await
        .unwrap_err();
    assert!(matches!(
        missing,
        DispatchError::Transport(TransportError::Status { status, .. }) if status == StatusCode::NOT_FOUND
    ));

    let unsupported = harness
        .client
        .resource("articles", [1])
        .unwrap()
        .delete(Query::new())
        .await
        .unwrap_err();
    assert_eq!(
        unsupported.to_string(),
        "Unknown Error: Server returned a status of 404"
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn health_endpoint_reports_resources() {
    let harness = Harness::start().await;

    let health: Value = reqwest::get(format!(
        "{}/health",
        harness
            .client
            .config()
            .transport
            .base_url
            .as_deref()
            .unwrap()
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(health["state"], "ready");
    assert_eq!(health["resources"], 2);

    harness.shutdown().await;
}
