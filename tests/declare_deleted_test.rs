use remote_document_client::{DocumentClient, DocumentServiceConfig, Timeouts};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "very-secret";

/// Counts error events emitted by this crate.
#[derive(Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() == Level::ERROR
            && metadata.target().starts_with("remote_document_client")
        {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn client(base_url: &str, timeout: Duration) -> DocumentClient {
    let config = DocumentServiceConfig::new(base_url, SECRET)
        .unwrap()
        .with_timeouts(Timeouts::uniform(timeout));
    DocumentClient::new(config).unwrap()
}

async fn declare_counting_errors(client: &DocumentClient, ids: &[Uuid]) -> usize {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let _guard = tracing::subscriber::set_default(subscriber);
    client.declare_deleted(ids).await;
    counter.count()
}

#[tokio::test(flavor = "current_thread")]
async fn test_accepted_declaration_logs_no_error() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/declare-files-as-deleted"))
        .and(header("X-Api-Key", SECRET))
        .and(body_json(json!({"files": [id.hyphenated().to_string()]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server.uri(), Duration::from_secs(2));
    assert_eq!(declare_counting_errors(&client, &[id]).await, 0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_refused_declaration_logs_exactly_one_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/declare-files-as-deleted"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is down"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server.uri(), Duration::from_secs(2));
    let ids = [Uuid::new_v4(), Uuid::new_v4()];
    assert_eq!(declare_counting_errors(&client, &ids).await, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_unexpected_success_status_still_logs_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/declare-files-as-deleted"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server.uri(), Duration::from_secs(2));
    assert_eq!(declare_counting_errors(&client, &[Uuid::new_v4()]).await, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_timed_out_declaration_logs_exactly_one_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/declare-files-as-deleted"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client(&server.uri(), Duration::from_millis(200));
    assert_eq!(declare_counting_errors(&client, &[Uuid::new_v4()]).await, 1);
}

#[tokio::test(flavor = "current_thread")]
async fn test_unreachable_service_logs_exactly_one_error() {
    let client = client("http://127.0.0.1:9/", Duration::from_secs(2));
    assert_eq!(declare_counting_errors(&client, &[Uuid::new_v4()]).await, 1);
}
