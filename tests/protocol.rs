//! End-to-end protocol tests over TCP.

use covid_data_sdk::{QueryClient, Record, Reply, GREETING};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

fn lagos() -> Record {
    Record {
        cumulative_test_positive: "10".into(),
        cumulative_test_performed: "200".into(),
        date: "2020-04-01".into(),
        discharged: "3".into(),
        expired: "1".into(),
        region: "Lagos".into(),
        admitted: "6".into(),
    }
}

fn regions(reply: &Reply) -> Vec<&str> {
    match reply {
        Reply::Records(records) => records.iter().map(|r| r.region.as_str()).collect(),
        other => panic!("expected records, got {other:?}"),
    }
}

#[tokio::test]
async fn region_lookup_is_case_insensitive() {
    let server = common::start_server("10,200,2020-04-01,3,1,Lagos,6\n").await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let reply = client.query_region("lagos").await.unwrap();
    assert_eq!(reply, Reply::Records(vec![lagos()]));
}

#[tokio::test]
async fn unknown_region_reports_nothing_found() {
    let server = common::start_server("10,200,2020-04-01,3,1,Lagos,6\n").await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    assert_eq!(client.query_region("Abuja").await.unwrap(), Reply::NothingFound);
}

#[tokio::test]
async fn empty_query_is_invalid() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    assert_eq!(client.send(br#"{"query":{}}"#).await.unwrap(), Reply::InvalidInput);
    assert_eq!(
        client.send(br#"{"query":{"region":"","date":""}}"#).await.unwrap(),
        Reply::InvalidInput
    );
}

#[tokio::test]
async fn connection_survives_malformed_json() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    assert_eq!(client.send(b"this is not json").await.unwrap(), Reply::InvalidInput);
    let reply = client.query_region("KANO").await.unwrap();
    assert_eq!(regions(&reply), vec!["Kano"]);
}

#[tokio::test]
async fn date_takes_priority_over_region() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let reply = client
        .send(br#"{"query":{"region":"lagos","date":"2020-04-02"}}"#)
        .await
        .unwrap();
    assert_eq!(regions(&reply), vec!["Kano", "Abuja"]);
}

#[tokio::test]
async fn concurrent_connections_do_not_cross_talk() {
    let server = common::start_server(common::DATASET).await;

    let tasks: Vec<_> = ["lagos", "kano", "abuja"]
        .into_iter()
        .map(|region| {
            let addr = server.addr;
            tokio::spawn(async move {
                let mut client = QueryClient::connect(addr).await.unwrap();
                let mut seen = Vec::new();
                for _ in 0..20 {
                    match client.query_region(region).await.unwrap() {
                        Reply::Records(records) => {
                            assert_eq!(records.len(), 1);
                            seen.push(records[0].region.to_lowercase());
                        }
                        other => panic!("unexpected reply: {other:?}"),
                    }
                }
                (region, seen)
            })
        })
        .collect();

    for task in tasks {
        let (region, seen) = task.await.unwrap();
        assert!(seen.iter().all(|r| r == region));
    }
}

#[tokio::test]
async fn wildcard_returns_every_record_in_file_order() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let reply = client.query_region("*").await.unwrap();
    assert_eq!(regions(&reply), vec!["Lagos", "Kano", "Abuja"]);
}

#[tokio::test]
async fn repeated_requests_get_identical_replies() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let first = client.query_date("2020-04-01").await.unwrap();
    let second = client.query_date("2020-04-01").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn wire_bytes_match_protocol() {
    let server = common::start_server("10,200,2020-04-01,3,1,Lagos,6\n").await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    let mut greeting = vec![0u8; GREETING.len()];
    stream.read_exact(&mut greeting).await.unwrap();
    assert_eq!(greeting, GREETING);

    stream.write_all(b"{\"query\":{\"region\":\"LAGOS\"}}\n").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    let expected = concat!(
        "[\n",
        " {\n",
        "  \"cumulativeTestPositive\": \"10\",\n",
        "  \"cumulativeTestPerformed\": \"200\",\n",
        "  \"date\": \"2020-04-01\",\n",
        "  \"discharged\": \"3\",\n",
        "  \"expired\": \"1\",\n",
        "  \"region\": \"Lagos\",\n",
        "  \"admitted\": \"6\"\n",
        " }\n",
        "]\n",
    );
    assert_eq!(reply, expected);
}

#[tokio::test]
async fn invalid_input_has_no_terminator() {
    let server = common::start_server(common::DATASET).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    let mut greeting = vec![0u8; GREETING.len()];
    stream.read_exact(&mut greeting).await.unwrap();

    stream.write_all(b"{\"query\":{}}\n").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    assert_eq!(reply, b"Invalid Input");
}

#[tokio::test]
async fn unterminated_request_is_answered_on_close() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    client.write_raw(br#"{"query":{"date":"2020-04-01"}}"#).await.unwrap();
    client.close_write().await.unwrap();

    let reply = client.read_reply().await.unwrap();
    assert_eq!(regions(&reply), vec!["Lagos"]);
    assert!(client.is_closed().await.unwrap());
}

#[tokio::test]
async fn request_split_across_writes_is_reassembled() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    client.write_raw(br#"{"query":{"reg"#).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    client.write_raw(b"ion\":\"abuja\"}}\n").await.unwrap();

    let reply = client.read_reply().await.unwrap();
    assert_eq!(regions(&reply), vec!["Abuja"]);
}

#[tokio::test]
async fn oversized_request_is_rejected_without_closing() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let huge = format!(r#"{{"query":{{"region":"{}"}}}}"#, "x".repeat(10_000));
    assert_eq!(client.send(huge.as_bytes()).await.unwrap(), Reply::InvalidInput);
    assert_eq!(client.query_region("nowhere").await.unwrap(), Reply::NothingFound);
}

#[tokio::test]
async fn connection_cap_queues_extra_clients() {
    let server = common::start_server_with(
        common::DATASET,
        covid_data_service::SessionSettings::default(),
        1,
    )
    .await;

    let first = QueryClient::connect(server.addr).await.unwrap();
    let waiting = tokio::spawn(QueryClient::connect(server.addr));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    drop(first);
    let mut second = tokio::time::timeout(std::time::Duration::from_secs(5), waiting)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.query_region("nowhere").await.unwrap(), Reply::NothingFound);
}

#[tokio::test]
async fn blank_line_gets_invalid_input() {
    let server = common::start_server(common::DATASET).await;
    let mut client = QueryClient::connect(server.addr).await.unwrap();

    let reply = tokio::time::timeout(std::time::Duration::from_secs(5), client.send(b""))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, Reply::InvalidInput);
    assert_eq!(client.query_region("kano").await.unwrap(), Reply::Records(vec![covid_data_sdk::Record {
        cumulative_test_positive: "4".into(),
        cumulative_test_performed: "90".into(),
        date: "2020-04-02".into(),
        discharged: "1".into(),
        expired: "0".into(),
        region: "Kano".into(),
        admitted: "3".into(),
    }]));
}
