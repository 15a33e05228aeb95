//! End-to-end flow through the public surface: metadata memoization,
//! query deduplication and transparent 429 recovery against one mock
//! transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use docrepo::{
    CacheOptions, ClientConfig, ClientResult, FetchRequest, FetchResponse, RepositoryClient,
    Transport,
};

const BASE_URL: &str = "https://demo.example.io/api/v2";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn response(status: u16, headers: Vec<(&str, &str)>, body: &[u8]) -> FetchResponse {
    let headers = headers
        .into_iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();
    FetchResponse::new(status, headers, body.to_vec())
}

/// Serves scripted responses per URL, repeating the last one.
struct FakeRepository {
    calls: AtomicUsize,
    routes: Mutex<Vec<(String, VecDeque<FetchResponse>)>>,
}

impl FakeRepository {
    fn new(routes: Vec<(&str, Vec<FetchResponse>)>) -> Arc<Self> {
        let routes = routes
            .into_iter()
            .map(|(url, responses)| (url.to_string(), responses.into()))
            .collect();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            routes: Mutex::new(routes),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeRepository {
    async fn fetch(&self, request: &FetchRequest) -> ClientResult<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // small latency so concurrent callers overlap
        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut routes = self.routes.lock();
        let (_, responses) = routes
            .iter_mut()
            .find(|(url, _)| *url == request.url)
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url));
        if responses.len() > 1 {
            Ok(responses.pop_front().unwrap())
        } else {
            Ok(responses.front().cloned().unwrap())
        }
    }
}

const METADATA: &[u8] = br#"{
    "refs": [ { "id": "master", "ref": "abc123", "label": "Master", "isMasterRef": true } ],
    "types": { "article": "Article" },
    "tags": ["featured"]
}"#;

#[tokio::test]
async fn metadata_then_queries_share_work() -> Result<()> {
    init_logging();

    let search_url = format!("{}/documents/search?ref=abc123", BASE_URL);
    let repo = FakeRepository::new(vec![
        (BASE_URL, vec![response(200, vec![], METADATA)]),
        (
            search_url.as_str(),
            vec![response(200, vec![], br#"{"results":[]}"#)],
        ),
    ]);
    let client = RepositoryClient::with_transport(
        ClientConfig::new(BASE_URL),
        Arc::clone(&repo) as Arc<dyn Transport>,
    );

    // repeated metadata lookups inside the TTL cost one call
    let info = client.repository().await?;
    assert_eq!(info.master_ref().unwrap().reference, "abc123");
    client.repository().await?;
    assert_eq!(repo.calls(), 1);

    // concurrent identical queries collapse into one physical call
    let (a, b) = tokio::join!(
        client.request(FetchRequest::get(&search_url)),
        client.request(FetchRequest::get(&search_url)),
    );
    assert!(a?.ok());
    assert!(b?.ok());
    assert_eq!(repo.calls(), 2);

    let stats = client.stats();
    assert_eq!(stats.physical_calls, 2);
    assert_eq!(stats.dedup_joins, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rate_limited_metadata_recovers_transparently() -> Result<()> {
    init_logging();

    let repo = FakeRepository::new(vec![(
        BASE_URL,
        vec![
            response(429, vec![("Retry-After", "2")], b"busy"),
            response(200, vec![], METADATA),
        ],
    )]);
    let client = RepositoryClient::with_transport(
        ClientConfig::new(BASE_URL),
        Arc::clone(&repo) as Arc<dyn Transport>,
    );

    let start = tokio::time::Instant::now();
    let info = client.repository().await?;

    // the caller sees the retried response, never the 429
    assert_eq!(info.tags, vec!["featured".to_string()]);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(repo.calls(), 2);
    assert_eq!(client.stats().rate_limit_retries, 1);
    Ok(())
}

#[tokio::test]
async fn expired_metadata_is_refetched() -> Result<()> {
    init_logging();

    let repo = FakeRepository::new(vec![(BASE_URL, vec![response(200, vec![], METADATA)])]);
    let client = RepositoryClient::with_transport(
        ClientConfig::new(BASE_URL),
        Arc::clone(&repo) as Arc<dyn Transport>,
    );

    // explicit zero TTL resolves to "do not cache"
    let options = CacheOptions::new().with_ttl(0);
    client.cached_request(BASE_URL, options.clone()).await?;
    client.cached_request(BASE_URL, options).await?;
    assert_eq!(repo.calls(), 2);
    Ok(())
}
