//! Serving over a Unix-domain socket.

#![cfg(unix)]

use covid_data_sdk::{QueryClient, Reply};
use covid_data_service::{Endpoint, Listener, QueryServer, SessionSettings};

mod common;

#[tokio::test]
async fn serves_queries_over_unix_socket() {
    let dataset = common::write_dataset(common::DATASET);
    let store = common::load_store(&dataset);

    let socket = std::env::temp_dir().join(format!("covid-{}.sock", uuid::Uuid::new_v4()));
    let endpoint = Endpoint::new("unix", socket.to_str().unwrap()).unwrap();
    let listener = Listener::bind(&endpoint, 0).await.unwrap();
    let handle = tokio::spawn(QueryServer::new(store, SessionSettings::default()).run(listener));

    let mut client = QueryClient::connect_unix(&socket).await.unwrap();
    match client.query_region("abuja").await.unwrap() {
        Reply::Records(records) => assert_eq!(records[0].region, "Abuja"),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(client.send(b"[]").await.unwrap(), Reply::InvalidInput);

    handle.abort();
    let _ = std::fs::remove_file(&socket);
    let _ = std::fs::remove_file(&dataset);
}
