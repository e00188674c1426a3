use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hazard_core::{
    FeedConfig, FetchError, NwsWeatherSource, ReliefWebSource, Severity, SourceAdapter,
    UsgsQuakeSource,
};

fn feed(url: String) -> FeedConfig {
    let mut config = FeedConfig::with_url(url);
    config.request_timeout_secs = 2;
    config
}

fn quake_payload() -> serde_json::Value {
    json!({
        "features": [
            {
                "id": "us7000abcd",
                "properties": {
                    "mag": 5.2,
                    "place": "42km SW of Hualien, Taiwan",
                    "time": 1729494480000i64,
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd"
                }
            },
            {
                "id": "us7000efgh",
                "properties": {
                    "mag": 2.9,
                    "place": "3km N of Ridgecrest, CA",
                    "time": 1729496400000i64,
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000efgh"
                }
            }
        ]
    })
}

#[tokio::test]
async fn usgs_fetch_normalizes_features() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quake_payload()))
        .mount(&server)
        .await;

    let source = UsgsQuakeSource::new(feed(format!("{}/quakes", server.uri())));
    let records = source.fetch(&reqwest::Client::new()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "us7000abcd");
    assert_eq!(records[0].magnitude, 5.2);
    assert_eq!(records[0].place, "42km SW of Hualien, Taiwan");
    assert!(records[0].occurred_at.is_some());
    assert!(records[0].url.as_deref().unwrap().contains("us7000abcd"));
}

#[tokio::test]
async fn malformed_entries_are_dropped_without_failing_the_batch() {
    let server = MockServer::start().await;
    // Middle entry has no magnitude, last has no id.
    let payload = json!({
        "features": [
            { "id": "ok1", "properties": { "mag": 4.1, "place": "A", "time": 1000 } },
            { "id": "broken", "properties": { "place": "B", "time": 2000 } },
            { "properties": { "mag": 3.3, "place": "C", "time": 3000 } },
            { "id": "ok2", "properties": { "mag": 2.2, "place": "D", "time": 4000 } }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(&server)
        .await;

    let source = UsgsQuakeSource::new(feed(format!("{}/quakes", server.uri())));
    let records = source.fetch(&reqwest::Client::new()).await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["ok1", "ok2"]);
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = UsgsQuakeSource::new(feed(format!("{}/quakes", server.uri())));
    let err = source.fetch(&reqwest::Client::new()).await.unwrap_err();

    assert!(matches!(err, FetchError::Status(status, _) if status.as_u16() == 503));
}

#[tokio::test]
async fn unexpected_top_level_shape_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "metadata": {} })))
        .mount(&server)
        .await;

    let source = UsgsQuakeSource::new(feed(format!("{}/quakes", server.uri())));
    let err = source.fetch(&reqwest::Client::new()).await.unwrap_err();

    assert!(matches!(err, FetchError::Shape(_)));
}

#[tokio::test]
async fn unparseable_payload_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let source = UsgsQuakeSource::new(feed(format!("{}/quakes", server.uri())));
    let err = source.fetch(&reqwest::Client::new()).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn slow_upstream_times_out_as_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quakes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(quake_payload())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = feed(format!("{}/quakes", server.uri()));
    config.request_timeout_secs = 1;
    let source = UsgsQuakeSource::new(config);
    let err = source.fetch(&reqwest::Client::new()).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn reliefweb_fetch_normalizes_entries() {
    let server = MockServer::start().await;
    let payload = json!({
        "data": [
            {
                "id": 52001,
                "fields": {
                    "type": [ { "name": "Flood" } ],
                    "country": [ { "name": "Bangladesh" } ],
                    "status": "ongoing",
                    "date": { "created": "2024-10-20T08:15:00+00:00" },
                    "url": "https://reliefweb.int/disaster/fl-2024-000123"
                }
            },
            {
                "id": "52002",
                "fields": {
                    "type": [ { "name": "Tropical Cyclone" } ],
                    "status": "alert"
                }
            },
            {
                // No type: dropped.
                "id": 52003,
                "fields": { "country": [ { "name": "Chile" } ] }
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/disasters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(&server)
        .await;

    let source = ReliefWebSource::new(feed(format!("{}/disasters", server.uri())));
    let records = source.fetch(&reqwest::Client::new()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "52001");
    assert_eq!(records[0].kind, "Flood");
    assert_eq!(records[0].country, "Bangladesh");
    assert_eq!(records[0].status, "ongoing");
    assert!(records[0].reported_at.is_some());

    // Missing country and date fall back instead of invalidating the entry.
    assert_eq!(records[1].id, "52002");
    assert_eq!(records[1].country, "Unknown");
    assert!(records[1].reported_at.is_none());
    assert!(records[1].url.is_none());
}

#[tokio::test]
async fn nws_fetch_maps_severity_and_identity() {
    let server = MockServer::start().await;
    let payload = json!({
        "features": [
            {
                "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.abc",
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.abc",
                    "event": "Tornado Warning",
                    "severity": "Extreme",
                    "areaDesc": "Dallas County, TX",
                    "headline": "Tornado Warning issued for Dallas County",
                    "sent": "2024-10-21T06:30:00-05:00"
                }
            },
            {
                "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.def",
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.def",
                    "event": "Dense Fog Advisory",
                    "severity": "NotARealSeverity",
                    "areaDesc": "San Joaquin Valley, CA"
                }
            },
            {
                // No event name: dropped.
                "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.ghi",
                "properties": { "id": "urn:oid:2.49.0.1.840.0.ghi", "severity": "Minor" }
            }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload))
        .mount(&server)
        .await;

    let source = NwsWeatherSource::new(feed(format!("{}/alerts", server.uri())));
    let records = source.fetch(&reqwest::Client::new()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "urn:oid:2.49.0.1.840.0.abc");
    assert_eq!(records[0].event, "Tornado Warning");
    assert_eq!(records[0].severity, Severity::Extreme);
    assert_eq!(records[0].area, "Dallas County, TX");
    assert!(records[0].sent.is_some());
    assert!(records[0].url.as_deref().unwrap().starts_with("https://"));

    // Unrecognized severity label degrades to Unknown, the entry survives.
    assert_eq!(records[1].severity, Severity::Unknown);
    assert!(records[1].headline.is_none());
}
