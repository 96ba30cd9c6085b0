// End-to-end registry tests: discovery events, address fallback,
// capability activation, listing, and teardown, with wiremock standing
// in for the scanners.

#![allow(clippy::unwrap_used)]

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scanfly_core::{
    AddrInfo, CoreError, JsonCapabilityParser, OptionIndex, OptionValue, Registry, RegistryConfig,
    StaticDevice,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn caps_doc() -> serde_json::Value {
    json!({
        "vendor": "ACME",
        "model": "Scan-o-matic 9000",
        "sources": {
            "Platen": {
                "color_modes": ["Color", "Grayscale"],
                "resolutions": { "Discrete": [100, 240, 300, 600] },
                "tl_x": { "min": 0.0, "max": 10.0 },
                "tl_y": { "min": 0.0, "max": 10.0 },
                "br_x": { "min": 0.0, "max": 215.9 },
                "br_y": { "min": 0.0, "max": 297.0 }
            }
        }
    })
}

fn no_source_doc() -> serde_json::Value {
    json!({
        "vendor": "ACME",
        "model": "Paperweight",
        "sources": {}
    })
}

async fn mock_scanner(doc: &serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ScannerCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc))
        .mount(&server)
        .await;
    server
}

async fn failing_scanner(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ScannerCapabilities"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn addr_for(server: &MockServer) -> AddrInfo {
    let uri: url::Url = server.uri().parse().unwrap();
    AddrInfo {
        addr: uri.host_str().unwrap().parse::<IpAddr>().unwrap(),
        port: uri.port().unwrap(),
        linklocal: false,
        interface: 0,
        rs: None,
    }
}

fn registry(list_timeout: Duration) -> Registry {
    let config = RegistryConfig {
        list_timeout,
        ..RegistryConfig::default()
    };
    Registry::start(config, Arc::new(JsonCapabilityParser)).unwrap()
}

// ── Discovery / fallback ────────────────────────────────────────────

#[tokio::test]
async fn fallback_reaches_second_address() {
    let bad = failing_scanner(500).await;
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&bad), addr_for(&good)]);
    discovery.initial_sweep_finished();

    let list = registry.list_devices().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Scanner1");
    assert_eq!(list[0].vendor, "ACME");
    assert_eq!(list[0].model, "Scan-o-matic 9000");
    assert_eq!(list[0].device_type, "eSCL network scanner");

    // Each candidate was probed exactly once, in order.
    assert_eq!(bad.received_requests().await.unwrap().len(), 1);
    assert_eq!(good.received_requests().await.unwrap().len(), 1);

    // The handle reflects the second (successful) candidate's defaults.
    let handle = registry.open("Scanner1").unwrap();
    assert_eq!(
        handle.get_option(OptionIndex::Resolution as usize).unwrap(),
        OptionValue::Int(300)
    );

    registry.shutdown().await;
}

#[tokio::test]
async fn exhausted_sweep_deletes_the_device() {
    let bad1 = failing_scanner(500).await;
    let bad2 = failing_scanner(404).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&bad1), addr_for(&bad2)]);
    discovery.initial_sweep_finished();

    let list = registry.list_devices().await;
    assert!(list.is_empty());
    assert_eq!(registry.device_count(), 0);

    // Exactly one attempt per candidate, no retries.
    assert_eq!(bad1.received_requests().await.unwrap().len(), 1);
    assert_eq!(bad2.received_requests().await.unwrap().len(), 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn unparsable_body_falls_back_like_transport_error() {
    let garbage = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ScannerCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&garbage)
        .await;
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&garbage), addr_for(&good)]);
    discovery.initial_sweep_finished();

    let list = registry.list_devices().await;
    assert_eq!(list.len(), 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn duplicate_found_is_a_silent_noop() {
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    discovery.initial_sweep_finished();

    let list = registry.list_devices().await;
    assert_eq!(list.len(), 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn removed_device_disappears() {
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    discovery.initial_sweep_finished();

    assert_eq!(registry.list_devices().await.len(), 1);
    let handle = registry.open("Scanner1").unwrap();

    discovery.device_removed("Scanner1");
    // Give the event task a moment to process the removal.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(registry.list_devices().await.is_empty());
    assert!(matches!(
        registry.open("Scanner1"),
        Err(CoreError::DeviceNotFound { .. })
    ));

    // The outstanding handle observes the deletion but stays usable.
    assert!(handle.is_halted());
    assert!(handle.get_option(OptionIndex::Resolution as usize).is_ok());

    registry.shutdown().await;
}

#[tokio::test]
async fn removal_mid_fetch_discards_the_completion() {
    // A scanner that answers only after a delay, so the device can be
    // removed while its capability fetch is still in flight.
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ScannerCapabilities"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(caps_doc())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&slow)
        .await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&slow)]);
    discovery.initial_sweep_finished();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.device_count(), 1);
    discovery.device_removed("Scanner1");

    // Wait past the response delay: the cancelled fetch's completion
    // must not resurrect the device.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(registry.device_count(), 0);
    assert!(registry.list_devices().await.is_empty());
    assert!(matches!(
        registry.open("Scanner1"),
        Err(CoreError::DeviceNotFound { .. })
    ));

    registry.shutdown().await;
}

// ── Static devices ──────────────────────────────────────────────────

#[tokio::test]
async fn static_device_is_fetched_once_and_listed() {
    let good = mock_scanner(&caps_doc()).await;

    let config = RegistryConfig {
        static_devices: vec![StaticDevice {
            name: "Office MFP".into(),
            url: good.uri().parse().unwrap(),
        }],
        ..RegistryConfig::default()
    };
    let registry = Registry::start(config, Arc::new(JsonCapabilityParser)).unwrap();
    registry.discovery().initial_sweep_finished();

    let list = registry.list_devices().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Office MFP");
    assert_eq!(good.received_requests().await.unwrap().len(), 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn static_device_with_no_sources_is_deleted() {
    let empty = mock_scanner(&no_source_doc()).await;

    let config = RegistryConfig {
        static_devices: vec![StaticDevice {
            name: "Office MFP".into(),
            url: empty.uri().parse().unwrap(),
        }],
        ..RegistryConfig::default()
    };
    let registry = Registry::start(config, Arc::new(JsonCapabilityParser)).unwrap();
    registry.discovery().initial_sweep_finished();

    assert!(registry.list_devices().await.is_empty());
    assert_eq!(registry.device_count(), 0);
    // Static devices get no fallback: exactly one attempt.
    assert_eq!(empty.received_requests().await.unwrap().len(), 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn static_device_failing_fetch_is_deleted_without_fallback() {
    let bad = failing_scanner(503).await;

    let config = RegistryConfig {
        static_devices: vec![StaticDevice {
            name: "Office MFP".into(),
            url: bad.uri().parse().unwrap(),
        }],
        ..RegistryConfig::default()
    };
    let registry = Registry::start(config, Arc::new(JsonCapabilityParser)).unwrap();
    registry.discovery().initial_sweep_finished();

    assert!(registry.list_devices().await.is_empty());
    assert_eq!(bad.received_requests().await.unwrap().len(), 1);

    registry.shutdown().await;
}

// ── Listing semantics ───────────────────────────────────────────────

#[tokio::test]
async fn list_blocks_until_sweep_finishes() {
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    assert!(discovery.is_initial_sweep_pending());

    // Signal the sweep from a separate task while list_devices waits.
    let sink = discovery.clone();
    let signaller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        sink.initial_sweep_finished();
    });

    let start = std::time::Instant::now();
    let list = registry.list_devices().await;
    signaller.await.unwrap();

    assert_eq!(list.len(), 1);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(!discovery.is_initial_sweep_pending());

    registry.shutdown().await;
}

#[tokio::test]
async fn list_times_out_when_sweep_never_finishes() {
    let registry = registry(Duration::from_millis(200));

    let start = std::time::Instant::now();
    let list = registry.list_devices().await;

    assert!(list.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(200));

    registry.shutdown().await;
}

#[tokio::test]
async fn probing_device_cannot_be_opened() {
    // A scanner that answers only after a long delay keeps the device
    // in the probing state for the duration of the test.
    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ScannerCapabilities"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(caps_doc())
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&slow)
        .await;

    let registry = registry(Duration::from_millis(200));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&slow)]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.device_count(), 1);
    assert!(matches!(
        registry.open("Scanner1"),
        Err(CoreError::DeviceNotFound { .. })
    ));

    // Still init-wait, so listing hits the timeout and omits it.
    let list = registry.list_devices().await;
    assert!(list.is_empty());

    registry.shutdown().await;
}

#[tokio::test]
async fn shutdown_purges_the_table() {
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    discovery.device_found("Scanner2", true, vec![addr_for(&good)]);
    discovery.initial_sweep_finished();

    assert_eq!(registry.list_devices().await.len(), 2);

    registry.shutdown().await;
    assert_eq!(registry.device_count(), 0);
}

// ── Option access through handles ───────────────────────────────────

#[tokio::test]
async fn handle_reads_options_and_descriptors() {
    let good = mock_scanner(&caps_doc()).await;

    let registry = registry(Duration::from_secs(5));
    let discovery = registry.discovery();
    discovery.device_found("Scanner1", true, vec![addr_for(&good)]);
    discovery.initial_sweep_finished();
    registry.list_devices().await;

    let handle = registry.open("Scanner1").unwrap();

    assert_eq!(
        handle.get_option(OptionIndex::NumOptions as usize).unwrap(),
        OptionValue::Int(10)
    );
    assert_eq!(
        handle.get_option(OptionIndex::ColorMode as usize).unwrap(),
        OptionValue::String("Color".into())
    );
    assert_eq!(
        handle.get_option(OptionIndex::Source as usize).unwrap(),
        OptionValue::String("Flatbed".into())
    );
    assert_eq!(
        handle.get_option(OptionIndex::BrX as usize).unwrap(),
        OptionValue::Fixed(215.9)
    );

    // Fixed table: descriptor present for all ten slots, absent beyond.
    assert!(handle.option_descriptor(9).is_some());
    assert!(handle.option_descriptor(10).is_none());

    // Out-of-table reads are invalid arguments.
    assert!(matches!(
        handle.get_option(42),
        Err(CoreError::InvalidOption { index: 42 })
    ));

    registry.close(handle);
    registry.shutdown().await;
}
