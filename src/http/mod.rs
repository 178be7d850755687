use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::channels::{ChannelSource, StaticChannelSource};
use crate::config::AppConfig;
use crate::runs::{self as run_store, RunStore};
use crate::telemetry::{self};
use crate::telemetry::ops::serve::Phase as ServePhase;

mod channels;
mod cors;
pub mod error;
mod macros;
mod runs;

use error::ApiError;
use macros::make_response;

/// `chandir serve`
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Listen address, overrides CHANDIR_BIND
    #[arg(long)]
    pub bind: Option<String>,
}

/// Shared by every request; nothing in here is mutated after startup.
pub struct AppState {
    pub channels: Arc<dyn ChannelSource>,
    /// `None` when no database is configured.
    pub runs: Option<Arc<dyn RunStore>>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let runs = run_store::open_store(cfg, &cfg.pool)?;
        if runs.is_none() {
            telemetry::serve().warn("⚠️  DATABASE_URL not set; /api/runs will answer 500");
        }
        Ok(Self { channels: Arc::new(StaticChannelSource), runs })
    }
}

pub async fn route(state: Arc<AppState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let span = tracing::info_span!("request", method = %method, path = %path);

    let res = async {
        match path.trim_end_matches('/') {
            "/api/channels" => channels::handle(&state, req).await,
            "/api/runs" => runs::handle(&state, req).await,
            "/health" => Ok(health()),
            _ => Err(ApiError::NotFound),
        }
    }
    .instrument(span)
    .await;

    let resp = res.unwrap_or_else(ApiError::into_response);
    telemetry::serve().request(method.as_str(), &path, resp.status().as_u16(), started.elapsed().as_millis() as u64);
    Ok(resp)
}

fn health() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .body(Body::from("OK"))
        .expect("failed to build health response")
}

/// Empty body is read as `{}` so missing fields surface as validation errors.
async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> error::Result<T> {
    let bytes = hyper::body::to_bytes(req.into_body()).await?;
    let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &bytes };
    Ok(serde_json::from_slice(raw)?)
}

fn json_ok<T: Serialize>(body: &T) -> error::Result<Response<Body>> {
    let value = serde_json::to_value(body).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(make_response!(StatusCode::OK, value))
}

/// Accept loop; one task per connection, returns once `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let log = telemetry::serve();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log.span(&ServePhase::Shutdown).in_scope(|| log.info("🛑 Shutting down"));
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(v) => v,
                    Err(err) => {
                        log.warn(format!("accept failed: {err}"));
                        continue;
                    }
                };
                log.span(&ServePhase::Accept).in_scope(|| tracing::debug!(%peer, "accepted connection"));

                let state = state.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| route(state.clone(), req));
                    if let Err(err) = Http::new().serve_connection(socket, service).await {
                        tracing::debug!(%peer, error = %err, "connection error");
                    }
                });
            }
        }
    }
}

pub async fn run(cfg: &AppConfig, args: ServeCmd) -> Result<()> {
    let log = telemetry::serve();
    let cfg = cfg.clone().with_overrides(None, args.bind);
    let addr = cfg.bind_addr()?;
    let state = Arc::new(AppState::from_config(&cfg)?);

    let listener = TcpListener::bind(addr)
        .instrument(log.span(&ServePhase::Bind))
        .await?;
    log.info(format!("🚀 Listening on {}", listener.local_addr()?));

    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::memory::MemoryRunStore;
    use hyper::header;
    use hyper::Method;
    use serde_json::{json, Value};

    fn state_with(runs: Option<Arc<dyn RunStore>>) -> Arc<AppState> {
        Arc::new(AppState { channels: Arc::new(StaticChannelSource), runs })
    }

    fn memory_state() -> (Arc<AppState>, Arc<MemoryRunStore>) {
        let store = Arc::new(MemoryRunStore::new());
        let dyn_store: Arc<dyn RunStore> = store.clone();
        (state_with(Some(dyn_store)), store)
    }

    fn request(method: Method, path: &str, body: Option<Value>) -> Request<Body> {
        let body = body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty);
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, hyper::HeaderMap, Vec<u8>) {
        let resp = route(state.clone(), req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap().to_vec();
        (status, headers, body)
    }

    async fn call_json(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = call(state, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn preflight_on_both_endpoints_without_database() {
        let state = state_with(None);
        for path in ["/api/channels", "/api/runs"] {
            let (status, headers, body) = call(&state, request(Method::OPTIONS, path, None)).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.is_empty());
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, X-User-Id");
            assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        }
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let state = state_with(None);
        for path in ["/api/channels", "/api/runs"] {
            let (status, headers, body) = call(&state, request(Method::DELETE, path, None)).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let v: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(v, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn channels_post_limits_results() {
        let state = state_with(None);
        let req = request(Method::POST, "/api/channels", Some(json!({"category": "marketing", "max_channels": 3})));
        let (status, v) = call_json(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["total"], 3);
        assert_eq!(v["channels"].as_array().unwrap().len(), 3);
        assert_eq!(v["category"], "marketing");
        assert_eq!(v["channels"][0]["link"], "https://t.me/marketing_zero");
    }

    #[tokio::test]
    async fn channels_post_over_limit_returns_all() {
        let state = state_with(None);
        let req = request(Method::POST, "/api/channels", Some(json!({"category": "marketing", "max_channels": 1000})));
        let (status, v) = call_json(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["total"], 8);
    }

    #[tokio::test]
    async fn channels_post_without_category_is_400() {
        let state = state_with(None);
        let (status, v) = call_json(&state, request(Method::POST, "/api/channels", Some(json!({"max_channels": 3})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(v["error"].as_str().unwrap().contains("category"));

        let (status, _) = call_json(&state, request(Method::POST, "/api/channels", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn channels_get_reports_identity() {
        let state = state_with(None);
        let (status, v) = call_json(&state, request(Method::GET, "/api/channels/", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["service"], "TGStat Parser API");
        assert_eq!(v["status"], "ready");
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn runs_without_database_is_500_json() {
        let state = state_with(None);
        let save = request(Method::POST, "/api/runs", Some(json!({"category": "x", "channels": []})));
        let (status, v) = call_json(&state, save).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"], "DATABASE_URL not configured");

        let (status, v) = call_json(&state, request(Method::GET, "/api/runs", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(v.get("error").is_some());
    }

    #[tokio::test]
    async fn missing_database_is_reported_before_body_validation() {
        let state = state_with(None);
        let save = request(Method::POST, "/api/runs", Some(json!({"channels": "not-a-list"})));
        let (status, v) = call_json(&state, save).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"], "DATABASE_URL not configured");
    }

    #[tokio::test]
    async fn save_dedups_links_and_reports_counts() {
        let (state, store) = memory_state();
        let body = json!({
            "category": "Marketing",
            "channels": [{"link": "https://t.me/a"}, {"link": "https://t.me/a"}],
            "status": "completed"
        });
        let (status, v) = call_json(&state, request(Method::POST, "/api/runs", Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        assert_eq!(v["saved_channels"], 1);
        assert_eq!(v["total_channels"], 2);
        let id = v["parsing_id"].as_i64().unwrap();
        assert_eq!(store.channels_for(id).len(), 1);
    }

    #[tokio::test]
    async fn save_then_history_round() {
        let (state, _) = memory_state();
        for category in ["A", "B"] {
            let body = json!({"category": category, "channels": [{"link": "https://t.me/x", "subscribers": 10}]});
            let (status, _) = call_json(&state, request(Method::POST, "/api/runs", Some(body))).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, v) = call_json(&state, request(Method::GET, "/api/runs", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["success"], true);
        let history = v["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["category"], "B");
        assert_eq!(history[0]["status"], "completed");
        assert!(history[0]["started_at"].as_str().unwrap().starts_with("2026-01-01T"));
    }

    #[tokio::test]
    async fn save_with_malformed_body_is_400() {
        let (state, store) = memory_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/runs")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, v) = call_json(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(v["error"].is_string());
        assert!(store.runs().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_500_without_details() {
        let store: Arc<dyn RunStore> = Arc::new(MemoryRunStore::failing());
        let state = state_with(Some(store));
        let body = json!({"category": "x", "channels": [{"link": "https://t.me/a"}]});
        let (status, v) = call_json(&state, request(Method::POST, "/api/runs", Some(body))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(v["error"], "Database operation failed");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let state = state_with(None);
        let (status, v) = call_json(&state, request(Method::GET, "/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(v["error"], "Not found");
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, state_with(None), async {
            let _ = rx.await;
        }));

        let client = hyper::Client::new();
        let resp = client
            .get(format!("http://{addr}/health").parse().unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "OK");
        drop(client);

        tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed");
    }
}
