//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use covid_data_service::net::SocketName;
use covid_data_service::store::LoadOptions;
use covid_data_service::{Endpoint, Listener, QueryServer, RecordStore, SessionSettings};
use tokio::task::JoinHandle;

/// Rows used by most tests: (positive, performed, date, discharged, expired, region, admitted).
pub const DATASET: &str = "\
10,200,2020-04-01,3,1,Lagos,6
4,90,2020-04-02,1,0,Kano,3
7,150,2020-04-02,2,1,Abuja,4
";

/// A running server bound to an ephemeral local address.
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
    dataset: PathBuf,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
        let _ = std::fs::remove_file(&self.dataset);
    }
}

/// Write `rows` to a uniquely named CSV file in the temp directory.
pub fn write_dataset(rows: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("covid-{}.csv", uuid::Uuid::new_v4()));
    std::fs::write(&path, rows).unwrap();
    path
}

pub fn load_store(path: &Path) -> RecordStore {
    RecordStore::load(path, LoadOptions::default()).unwrap()
}

/// Load `rows` and serve them over TCP on 127.0.0.1.
pub async fn start_server(rows: &str) -> TestServer {
    start_server_with(rows, SessionSettings::default(), 0).await
}

pub async fn start_server_with(rows: &str, settings: SessionSettings, max_connections: usize) -> TestServer {
    let dataset = write_dataset(rows);
    let store = load_store(&dataset);

    let endpoint = Endpoint::new("tcp", "127.0.0.1:0").unwrap();
    let listener = Listener::bind(&endpoint, max_connections).await.unwrap();
    let addr = match listener.local_name().unwrap() {
        SocketName::Tcp(addr) => addr,
        other => panic!("expected a tcp listener, got {other}"),
    };

    let handle = tokio::spawn(QueryServer::new(store, settings).run(listener));
    TestServer { addr, handle, dataset }
}
