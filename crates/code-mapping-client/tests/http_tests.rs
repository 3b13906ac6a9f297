//! HTTP tests against a local one-request-per-connection responder.

use code_mapping::{
    CodeMappingConfig, CodeMappingError, CodeMappingService, ConceptMapSource,
    ExponentialBackoffRetry, RetryConfig,
};
use code_mapping_client::{Error, HttpConceptMapClient};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serves `connections` requests, answering each by path from `routes`
/// (unknown paths get a 404). Returns the base URL and the raw requests.
fn serve(
    connections: usize,
    routes: HashMap<String, (u16, String)>,
) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                buffer.extend_from_slice(&chunk[..read]);
            }
            let request = String::from_utf8_lossy(&buffer).to_string();
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default()
                .to_string();

            let (status, body) = routes
                .get(&path)
                .cloned()
                .unwrap_or((404, "Not Found".to_string()));
            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            requests.push(request);
        }
        requests
    });

    (base_url, handle)
}

fn route(path: &str, status: u16, body: serde_json::Value) -> (String, (u16, String)) {
    (path.to_string(), (status, body.to_string()))
}

#[test]
fn test_fetches_concept_map_with_profile_header() {
    let (base_url, server) = serve(
        1,
        HashMap::from([route(
            "/conceptmap/DiseaseA",
            200,
            serde_json::json!({"d1": "mappedDisease", "d2": ""}),
        )]),
    );

    let client = HttpConceptMapClient::new(base_url, "/").unwrap();
    let map = client.get_concept_map("DiseaseA").unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["d1"], "mappedDisease");
    assert_eq!(map["d2"], "");

    let requests = server.join().unwrap();
    let request = requests[0].to_lowercase();
    assert!(request.starts_with("get /conceptmap/diseasea http/1.1"));
    assert!(request.contains("x-fhir-profile: fhir-profile-snapshots"));
    assert!(request.contains("accept: application/json"));
}

#[test]
fn test_non_success_status_is_an_error() {
    let (base_url, server) = serve(1, HashMap::new());

    let client = HttpConceptMapClient::new(base_url, "/").unwrap();
    let err = client.get_concept_map("MissingMap").unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, ref name } if name == "MissingMap"));
    server.join().unwrap();
}

#[test]
fn test_malformed_body_is_an_error() {
    let (base_url, server) = serve(
        1,
        HashMap::from([route(
            "/conceptmap/Broken",
            200,
            serde_json::json!({"d1": 42}),
        )]),
    );

    let client = HttpConceptMapClient::new(base_url, "/").unwrap();
    let err = client.fetch("Broken").unwrap_err();
    assert!(matches!(err, CodeMappingError::SourceUnavailable { ref name, .. } if name == "Broken"));
    server.join().unwrap();
}

#[test]
fn test_connection_refused_is_an_error() {
    let base_url = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let client =
        HttpConceptMapClient::with_timeout(base_url, "/", Duration::from_secs(2)).unwrap();
    assert!(matches!(
        client.get_concept_map("DiseaseA"),
        Err(Error::Http(_))
    ));
}

#[test]
fn test_service_loads_categories_over_http() {
    let (base_url, server) = serve(
        3,
        HashMap::from([
            route(
                "/translation/conceptmap/DiseaseA",
                200,
                serde_json::json!({"d1": "mappedDisease"}),
            ),
            route(
                "/translation/conceptmap/LabA",
                200,
                serde_json::json!({"l1": "mappedLab"}),
            ),
        ]),
    );

    let config = CodeMappingConfig::builder()
        .with_base_url(base_url)
        .with_context_path("/translation/")
        .with_cache_reload_cron("*/30 * * * * *")
        .with_category("disease", ["DiseaseA", "MissingMap"])
        .with_category("laboratory", ["LabA"])
        .build();
    let client = HttpConceptMapClient::from_config(&config).unwrap();
    let retry = ExponentialBackoffRetry::new(RetryConfig {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        max_attempts: Some(3),
    });
    let service = CodeMappingService::with_retry(client, config, retry).unwrap();

    service.load_concept_maps();

    assert_eq!(
        service.map_disease_code("d1").unwrap().as_deref(),
        Some("mappedDisease")
    );
    assert_eq!(
        service.map_laboratory_code("l1").unwrap().as_deref(),
        Some("mappedLab")
    );
    assert_eq!(server.join().unwrap().len(), 3);
}
