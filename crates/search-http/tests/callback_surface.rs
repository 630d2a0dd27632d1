use search::{ClientConfig, ErrorKind, RawResponse, SearchError};
use search_http::{callback, connect, CallbackClient, HttpTransport};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Outcome<T> = (Option<SearchError>, Option<T>, Option<RawResponse>);

fn callback_client(uri: &str) -> CallbackClient<HttpTransport> {
    let config = ClientConfig::builder(uri, "test-key").build().unwrap();
    CallbackClient::on_current_runtime(connect(config).unwrap()).unwrap()
}

#[tokio::test]
async fn callback_receives_value_and_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/hotels/stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "documentCount": 3, "storageSize": 512 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (tx, rx) = oneshot::channel::<Outcome<Value>>();
    let handle = callback_client(&server.uri())
        .get_index_stats(
            "hotels",
            callback(move |err, value, raw| {
                let _ = tx.send((err, value, raw));
            }),
        )
        .unwrap();
    handle.await.unwrap();

    let (err, value, raw) = rx.await.unwrap();
    assert!(err.is_none());
    assert_eq!(value.unwrap()["documentCount"], 3);
    assert_eq!(raw.unwrap().status, 200);
}

#[tokio::test]
async fn callback_receives_service_error_with_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/indexers/nightly"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "ResourceNotFound", "message": "Indexer 'nightly' was not found" }
        })))
        .mount(&server)
        .await;

    let (tx, rx) = oneshot::channel::<Outcome<Value>>();
    callback_client(&server.uri())
        .delete_indexer(
            "nightly",
            callback(move |err, value, raw| {
                let _ = tx.send((err, value, raw));
            }),
        )
        .unwrap()
        .await
        .unwrap();

    let (err, value, raw) = rx.await.unwrap();
    let err = err.unwrap();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.code().unwrap().to_string(), "ResourceNotFound");
    assert!(value.is_none());
    assert_eq!(raw.unwrap().status, 404);
}

#[tokio::test]
async fn request_is_sent_without_callback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexers/nightly/run"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    callback_client(&server.uri())
        .run_indexer("nightly", None)
        .unwrap()
        .await
        .unwrap();
}

#[tokio::test]
async fn argument_error_is_returned_synchronously() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = callback_client(&server.uri());
    let err = client
        .lookup(
            "hotels",
            "",
            callback(|_, _, _| panic!("callback must not fire for argument errors")),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(err.message(), "key is not defined");

    let err = client.create_index(Value::Null, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}

#[tokio::test]
async fn version_gate_is_checked_before_spawning() {
    let config = ClientConfig::builder("https://svc.example.net", "test-key")
        .version("2015-02-28")
        .build()
        .unwrap();
    let client = CallbackClient::on_current_runtime(connect(config).unwrap()).unwrap();

    let err = client
        .list_synonym_maps(callback(|_, _, _| panic!("callback must not fire")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
}
