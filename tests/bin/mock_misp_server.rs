use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// --- Data Structures (MISP serializes numeric fields as JSON strings) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockAttribute {
    id: String,
    event_id: String,
    #[serde(rename = "type")]
    attribute_type: String,
    value: String,
    category: String,
    to_ids: String,
    distribution: String,
    comment: String,
    timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockTag {
    name: String,
    colour: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockEvent {
    id: String,
    uuid: String,
    info: String,
    distribution: String,
    threat_level_id: String,
    analysis: String,
    date: String,
    published: bool,
    timestamp: String,
    org_id: String,
    orgc_id: String,
    #[serde(rename = "Attribute")]
    attributes: Vec<MockAttribute>,
    #[serde(rename = "Tag")]
    tags: Vec<MockTag>,
}

#[derive(Debug, Clone, Serialize)]
struct MockFeed {
    id: String,
    name: String,
    provider: String,
    source_format: String,
    url: String,
    input_source: String,
    enabled: String,
    caching_enabled: String,
    description: String,
}

// --- Mock Input Structs for Deserialization ---

#[derive(Deserialize, Debug, Clone)]
struct MockInputEvent {
    info: String,
    distribution: u8,
    threat_level_id: u8,
    analysis: u8,
    date: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
struct MockInputAttribute {
    #[serde(rename = "type")]
    attribute_type: String,
    value: String,
    category: String,
    to_ids: bool,
    distribution: u8,
    comment: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MockSearchBody {
    #[serde(rename = "returnFormat")]
    _return_format: Option<String>,
    limit: Option<usize>,
    // Date bounds are accepted but not applied, so recent-event windows always
    // match the seeded data regardless of when the tests run.
    from: Option<String>,
    to: Option<String>,
}

struct MockData {
    events: HashMap<String, MockEvent>,
    next_event_id: u32,
    next_attribute_id: u32,
}

static MOCK_DATA: Lazy<Mutex<MockData>> = Lazy::new(|| {
    let mut events = HashMap::new();

    events.insert(
        "1".to_string(),
        MockEvent {
            id: "1".to_string(),
            uuid: "5e8f3c1a-6f2b-4d9e-8a7c-0b1d2e3f4a5b".to_string(),
            info: "Phishing campaign targeting finance team".to_string(),
            distribution: "1".to_string(),
            threat_level_id: "2".to_string(),
            analysis: "1".to_string(),
            date: "2024-05-01".to_string(),
            published: false,
            timestamp: "1714561000".to_string(),
            org_id: "1".to_string(),
            orgc_id: "2".to_string(),
            attributes: vec![
                MockAttribute {
                    id: "11".to_string(),
                    event_id: "1".to_string(),
                    attribute_type: "ip-src".to_string(),
                    value: "198.51.100.7".to_string(),
                    category: "Network activity".to_string(),
                    to_ids: "1".to_string(),
                    distribution: "5".to_string(),
                    comment: String::new(),
                    timestamp: "1714561100".to_string(),
                },
                MockAttribute {
                    id: "12".to_string(),
                    event_id: "1".to_string(),
                    attribute_type: "domain".to_string(),
                    value: "evil.example.com".to_string(),
                    category: "Network activity".to_string(),
                    to_ids: "1".to_string(),
                    distribution: "5".to_string(),
                    comment: "landing page".to_string(),
                    timestamp: "1714561200".to_string(),
                },
                MockAttribute {
                    id: "13".to_string(),
                    event_id: "1".to_string(),
                    attribute_type: "md5".to_string(),
                    value: "44d88612fea8a8f36de82e1278abb02f".to_string(),
                    category: "Payload delivery".to_string(),
                    to_ids: "0".to_string(),
                    distribution: "5".to_string(),
                    comment: "dropper".to_string(),
                    timestamp: "1714561300".to_string(),
                },
            ],
            tags: vec![
                MockTag {
                    name: "tlp:amber".to_string(),
                    colour: "#ffc000".to_string(),
                },
                MockTag {
                    name: "phishing".to_string(),
                    colour: "#0088cc".to_string(),
                },
            ],
        },
    );

    events.insert(
        "2".to_string(),
        MockEvent {
            id: "2".to_string(),
            uuid: "7a9b0c1d-2e3f-4a5b-6c7d-8e9f0a1b2c3d".to_string(),
            info: "Ransomware infrastructure tracking".to_string(),
            distribution: "2".to_string(),
            threat_level_id: "1".to_string(),
            analysis: "2".to_string(),
            date: "2024-05-03".to_string(),
            published: true,
            timestamp: "1714700000".to_string(),
            org_id: "1".to_string(),
            orgc_id: "1".to_string(),
            attributes: vec![],
            tags: vec![],
        },
    );

    Mutex::new(MockData {
        events,
        next_event_id: 42,
        next_attribute_id: 100,
    })
});

fn not_found_body(path: &str) -> serde_json::Value {
    json!({
        "name": "Invalid event.",
        "message": "Invalid event.",
        "url": path,
    })
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

async fn get_server_version() -> impl IntoResponse {
    info!("GET /servers/getVersion");
    (
        StatusCode::OK,
        Json(json!({
            "version": "2.4.190",
            "application": "MISP",
            "api_version": "1",
            "perm_sync": true,
            "perm_sighting": true,
        })),
    )
}

async fn get_event_by_id(Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /events/view/{}", id);

    // Event 500 simulates a MISP-side failure for error-path tests.
    if id == "500" {
        warn!("Simulating server error for event 500");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "Internal server error"})),
        )
            .into_response();
    }

    let data = MOCK_DATA.lock().unwrap();
    match data.events.get(&id) {
        Some(event) => (StatusCode::OK, Json(json!({"Event": event}))).into_response(),
        None => {
            warn!("Event not found: {}", id);
            (
                StatusCode::NOT_FOUND,
                Json(not_found_body(&format!("/events/view/{}", id))),
            )
                .into_response()
        }
    }
}

async fn add_event(Json(payload): Json<MockInputEvent>) -> impl IntoResponse {
    info!("POST /events/add with payload: {:?}", payload);

    let mut data = MOCK_DATA.lock().unwrap();
    let event_id = data.next_event_id;
    data.next_event_id += 1;

    let now = Utc::now();
    let new_event = MockEvent {
        id: event_id.to_string(),
        uuid: format!("mock-uuid-{}", event_id),
        info: payload.info,
        distribution: payload.distribution.to_string(),
        threat_level_id: payload.threat_level_id.to_string(),
        analysis: payload.analysis.to_string(),
        date: payload
            .date
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        published: false,
        timestamp: now.timestamp().to_string(),
        org_id: "1".to_string(),
        orgc_id: "1".to_string(),
        attributes: vec![],
        tags: vec![],
    };

    data.events.insert(new_event.id.clone(), new_event.clone());
    info!("Created new event {}", new_event.id);
    (StatusCode::OK, Json(json!({"Event": new_event}))).into_response()
}

async fn rest_search(Json(body): Json<MockSearchBody>) -> impl IntoResponse {
    info!(
        "POST /events/restSearch (limit: {:?}, from: {:?}, to: {:?})",
        body.limit, body.from, body.to
    );

    let data = MOCK_DATA.lock().unwrap();
    let mut events: Vec<MockEvent> = data.events.values().cloned().collect();
    events.sort_by(|a, b| a.id.cmp(&b.id));
    if let Some(limit) = body.limit {
        events.truncate(limit);
    }

    let wrapped: Vec<serde_json::Value> = events.iter().map(|e| json!({"Event": e})).collect();
    (StatusCode::OK, Json(json!({"response": wrapped}))).into_response()
}

async fn add_attribute(
    Path(event_id): Path<String>,
    Json(payload): Json<MockInputAttribute>,
) -> impl IntoResponse {
    info!(
        "POST /attributes/add/{} with payload: {:?}",
        event_id, payload
    );

    let mut data = MOCK_DATA.lock().unwrap();
    if !data.events.contains_key(&event_id) {
        warn!("Event not found for attribute: {}", event_id);
        return (
            StatusCode::NOT_FOUND,
            Json(not_found_body(&format!("/attributes/add/{}", event_id))),
        )
            .into_response();
    }

    let attribute_id = data.next_attribute_id;
    data.next_attribute_id += 1;

    let attribute = MockAttribute {
        id: attribute_id.to_string(),
        event_id: event_id.clone(),
        attribute_type: payload.attribute_type,
        value: payload.value,
        category: payload.category,
        to_ids: if payload.to_ids { "1" } else { "0" }.to_string(),
        distribution: payload.distribution.to_string(),
        comment: payload.comment.unwrap_or_default(),
        timestamp: Utc::now().timestamp().to_string(),
    };

    if let Some(event) = data.events.get_mut(&event_id) {
        event.attributes.push(attribute.clone());
    }

    info!("Added attribute {} to event {}", attribute.id, event_id);
    (StatusCode::OK, Json(json!({"Attribute": attribute}))).into_response()
}

async fn list_feeds() -> impl IntoResponse {
    info!("GET /feeds/index");

    let feeds = vec![
        MockFeed {
            id: "1".to_string(),
            name: "CIRCL OSINT Feed".to_string(),
            provider: "CIRCL".to_string(),
            source_format: "misp".to_string(),
            url: "https://www.circl.lu/doc/misp/feed-osint".to_string(),
            input_source: "network".to_string(),
            enabled: "1".to_string(),
            caching_enabled: "1".to_string(),
            description: "OSINT feed from CIRCL".to_string(),
        },
        MockFeed {
            id: "2".to_string(),
            name: "Botvrij.eu Data".to_string(),
            provider: "Botvrij.eu".to_string(),
            source_format: "misp".to_string(),
            url: "https://www.botvrij.eu/data/feed-osint".to_string(),
            input_source: "network".to_string(),
            enabled: "0".to_string(),
            caching_enabled: "0".to_string(),
            description: String::new(),
        },
    ];

    let wrapped: Vec<serde_json::Value> = feeds.iter().map(|f| json!({"Feed": f})).collect();
    (StatusCode::OK, Json(wrapped)).into_response()
}

async fn catch_all(
    method: axum::http::Method,
    uri: axum::http::Uri,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    warn!("Unhandled request: {} {}", method, path);

    let body_str = String::from_utf8_lossy(&body);
    if !body_str.is_empty() {
        warn!("Request body: {}", body_str);
    }

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "name": "Not found.",
            "message": format!("No handler for: {} {}. Check available routes.", method, path),
            "available_routes_info": [
                "GET /health",
                "GET /servers/getVersion",
                "POST /events/add",
                "GET /events/view/:id",
                "POST /events/restSearch",
                "POST /attributes/add/:event_id",
                "GET /feeds/index"
            ]
        })),
    )
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr) // Log to stderr for tests
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting Mock MISP Server...");

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/servers/getVersion", get(get_server_version))
        .route("/events/add", post(add_event))
        .route("/events/view/:id", get(get_event_by_id))
        .route("/events/restSearch", post(rest_search))
        .route("/attributes/add/:event_id", post(add_attribute))
        .route("/feeds/index", get(list_feeds))
        .fallback(catch_all)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let port = addr.port();

    println!("MOCK_SERVER_PORT={}", port); // Critical for test harness
    info!("Mock server listening on 127.0.0.1:{}", port);

    axum::serve(listener, app).await.unwrap();
}
