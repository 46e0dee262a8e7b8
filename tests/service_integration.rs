use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cambio::core::deadline::Deadline;
use cambio::core::error::StoreError;
use cambio::core::quote::{CurrencyPair, Quote};
use cambio::core::store::{QuoteStore, StoredQuote};
use cambio::providers::awesome_api::AwesomeApiProvider;
use cambio::server::{AppState, app_router};
use cambio::store::disk::DiskQuoteStore;

mod test_utils {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const QUOTE_BODY: &str = r#"{
        "USDBRL": {
            "code": "USD",
            "codein": "BRL",
            "name": "Dólar Americano/Real Brasileiro",
            "high": "5.8296",
            "low": "5.7215",
            "varBid": "-0.0249",
            "pctChange": "-0.43",
            "bid": "5.7809",
            "ask": "5.7814",
            "timestamp": "1731604922",
            "create_date": "2024-11-14 14:22:02"
        }
    }"#;

    /// Provider stub answering the AwesomeAPI `last` route for USD-BRL.
    pub async fn create_provider_stub(template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/last/USD-BRL"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }

    /// Run the service on an ephemeral port. Budgets here are deliberately
    /// generous so only the stubs under test introduce delay; the tight
    /// production defaults are exercised by the unit tests.
    pub async fn spawn_service(
        provider_url: &str,
        store: Arc<dyn QuoteStore>,
        fetch_budget: Duration,
    ) -> SocketAddr {
        let provider =
            AwesomeApiProvider::new(provider_url, CurrencyPair::new("USD", "BRL"), fetch_budget)
                .expect("Failed to build provider client");
        let state = AppState {
            provider: Arc::new(provider),
            store,
            request_ceiling: Duration::from_secs(5),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Listener has no local addr");
        tokio::spawn(async move {
            axum::serve(listener, app_router(state))
                .await
                .expect("Server task failed");
        });
        addr
    }

    pub fn open_disk_store(dir: &std::path::Path) -> Arc<DiskQuoteStore> {
        Arc::new(DiskQuoteStore::open(dir, Duration::from_secs(2)).expect("Failed to open store"))
    }
}

#[test_log::test(tokio::test)]
async fn test_quote_is_served_verbatim_and_persisted() {
    let provider_stub = test_utils::create_provider_stub(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::QUOTE_BODY),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = test_utils::open_disk_store(dir.path());
    let addr =
        test_utils::spawn_service(&provider_stub.uri(), store.clone(), Duration::from_secs(2))
            .await;

    let response = reqwest::get(format!("http://{addr}/cotacao")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    // Every field reaches the caller exactly as the provider sent it.
    let envelope: serde_json::Value = serde_json::from_str(test_utils::QUOTE_BODY).unwrap();
    assert_eq!(body, envelope["USDBRL"]);
    assert_eq!(body["bid"], "5.7809");

    // Persisted once, content untouched, identity only on the stored side.
    assert_eq!(store.count().unwrap(), 1);
    let stored = store.get(1).unwrap().expect("Quote was not persisted");
    assert_eq!(stored.quote.bid, "5.7809");
    assert_eq!(stored.quote.create_date, "2024-11-14 14:22:02");
    assert!(body.get("id").is_none());

    // The bare root serves the same handler.
    let root = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(root.status(), 200);
}

#[test_log::test(tokio::test)]
async fn test_slow_provider_fails_fast_without_persisting() {
    let template = wiremock::ResponseTemplate::new(200)
        .set_body_string(test_utils::QUOTE_BODY)
        .set_delay(Duration::from_secs(2));
    let provider_stub = test_utils::create_provider_stub(template).await;
    let dir = tempfile::tempdir().unwrap();
    let store = test_utils::open_disk_store(dir.path());
    let addr = test_utils::spawn_service(
        &provider_stub.uri(),
        store.clone(),
        Duration::from_millis(50),
    )
    .await;

    let started = std::time::Instant::now();
    let response = reqwest::get(format!("http://{addr}/cotacao")).await.unwrap();
    assert_eq!(response.status(), 417);
    // Answered at the fetch budget, not at the provider's pace.
    assert!(started.elapsed() < Duration::from_secs(1));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::Value::Null);
    assert_eq!(store.count().unwrap(), 0);
}

/// Store double whose engine always rejects the write.
struct RejectingStore;

#[async_trait::async_trait]
impl QuoteStore for RejectingStore {
    async fn insert(&self, _parent: Deadline, _quote: Quote) -> Result<StoredQuote, StoreError> {
        Err(StoreError::Backend("injected failure".to_string()))
    }
}

#[test_log::test(tokio::test)]
async fn test_store_failure_shadows_fetched_quote() {
    let provider_stub = test_utils::create_provider_stub(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::QUOTE_BODY),
    )
    .await;
    let addr = test_utils::spawn_service(
        &provider_stub.uri(),
        Arc::new(RejectingStore),
        Duration::from_secs(2),
    )
    .await;

    let response = reqwest::get(format!("http://{addr}/cotacao")).await.unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::Value::Null);

    // The quote was fetched (exactly one provider call) before the write
    // failure shadowed it.
    let calls = provider_stub.received_requests().await.unwrap();
    assert_eq!(calls.len(), 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn test_concurrent_requests_get_distinct_ids() {
    let provider_stub = test_utils::create_provider_stub(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::QUOTE_BODY),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = test_utils::open_disk_store(dir.path());
    let addr =
        test_utils::spawn_service(&provider_stub.uri(), store.clone(), Duration::from_secs(2))
            .await;

    let client = reqwest::Client::new();
    let calls = (0..16).map(|_| {
        let client = client.clone();
        let url = format!("http://{addr}/cotacao");
        async move {
            let response = client.get(&url).send().await.expect("Request failed");
            let status = response.status().as_u16();
            let body: serde_json::Value = response.json().await.expect("Body was not JSON");
            (status, body)
        }
    });
    let outcomes = futures::future::join_all(calls).await;

    for (status, body) in &outcomes {
        assert_eq!(*status, 200);
        assert_eq!(body["bid"], "5.7809");
    }

    // One record per request, ids consecutive from 1 with no gaps or reuse.
    assert_eq!(store.count().unwrap(), 16);
    for id in 1..=16 {
        assert!(store.get(id).unwrap().is_some(), "missing stored id {id}");
    }
    assert!(store.get(17).unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_service_stays_responsive_after_repeated_timeouts() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The provider is slow for the first four calls, then recovers.
    let provider_stub = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/last/USD-BRL"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(test_utils::QUOTE_BODY)
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(4)
        .mount(&provider_stub)
        .await;
    Mock::given(method("GET"))
        .and(path("/json/last/USD-BRL"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_utils::QUOTE_BODY))
        .mount(&provider_stub)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = test_utils::open_disk_store(dir.path());
    let addr = test_utils::spawn_service(
        &provider_stub.uri(),
        store.clone(),
        Duration::from_millis(50),
    )
    .await;

    let client = reqwest::Client::new();
    for _ in 0..4 {
        let response = client
            .get(format!("http://{addr}/cotacao"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 417);
    }

    // Abandoned fetches must not wedge the service: the next request, against
    // the recovered provider, succeeds and persists.
    let response = client
        .get(format!("http://{addr}/cotacao"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(store.count().unwrap(), 1);
}

#[test_log::test(tokio::test)]
async fn test_fetch_command_round_trip_through_live_service() {
    let provider_stub = test_utils::create_provider_stub(
        wiremock::ResponseTemplate::new(200).set_body_string(test_utils::QUOTE_BODY),
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = test_utils::open_disk_store(dir.path());
    let addr =
        test_utils::spawn_service(&provider_stub.uri(), store.clone(), Duration::from_secs(2))
            .await;

    // Point the client at the live service through a config file, the way an
    // operator would.
    let out_dir = tempfile::tempdir().unwrap();
    let output_path = out_dir.path().join("cotacao.txt");
    let config_file = tempfile::NamedTempFile::new().unwrap();
    let config_content = format!(
        r#"
client:
  endpoint: "http://{addr}/cotacao"
  timeout_ms: 2000
  output_path: "{}"
"#,
        output_path.display()
    );
    std::fs::write(config_file.path(), &config_content).unwrap();

    let result = cambio::run_command(
        cambio::AppCommand::Fetch,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Fetch command failed: {:?}", result.err());

    let content = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(content, "Dolar: 5.7809");
    // The fetched quote also went through the service's own persistence.
    assert_eq!(store.count().unwrap(), 1);
}
