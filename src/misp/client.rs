use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};

use super::error::MispApiError;
use super::models::{
    Attribute, AttributeEnvelope, ConnectionStatus, Event, EventEnvelope, EventSearchQuery, Feed,
    FeedEnvelope, NewAttribute, NewEvent, SearchEventsResponse, VersionInfo,
};

/// Gateway to a MISP instance. All remote I/O in this crate goes through here;
/// responses are decoded into typed records at this boundary so the tool layer
/// never touches raw JSON.
///
/// Building the client performs no network round-trip. The connection is
/// established on the first real call and reused for the process lifetime.
#[derive(Debug, Clone)]
pub struct MispClient {
    client: Client,
    base_url: String,
    verify_ssl: bool,
}

impl MispClient {
    pub fn new(base_url: String, api_key: String, verify_ssl: bool) -> Result<Self, MispApiError> {
        debug!(%base_url, %verify_ssl, "Creating new MispClient with API key");

        let mut auth_value = HeaderValue::from_str(&api_key).map_err(|_| {
            MispApiError::ConfigurationError(
                "MISP API key contains characters that are not valid in an HTTP header"
                    .to_string(),
            )
        })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .user_agent(concat!("mcp-server-misp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MispApiError::HttpClientCreationError)?;

        debug!("MISP client configuration created successfully with API key");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            verify_ssl,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Connectivity probe. Issues the version query and folds any failure into
    /// `ConnectionStatus::Error` instead of propagating it.
    pub async fn test_connection(&self) -> ConnectionStatus {
        match self.get_version().await {
            Ok(version_info) => ConnectionStatus::Connected {
                version: version_info.version,
                client_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            Err(e) => {
                error!("Connection test failed: {}", e);
                ConnectionStatus::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    pub async fn get_version(&self) -> Result<VersionInfo, MispApiError> {
        debug!("Retrieving version information from MISP");

        let response = self
            .client
            .get(format!("{}/servers/getVersion", self.base_url))
            .send()
            .await?;
        let response = ensure_success(response, "version query").await?;
        decode::<VersionInfo>(response, "version info").await
    }

    pub async fn add_event(&self, event: NewEvent) -> Result<Event, MispApiError> {
        debug!(info = %event.info, "Creating event in MISP");
        info!("Creating event: {}", event.info);

        let response = self
            .client
            .post(format!("{}/events/add", self.base_url))
            .json(&event)
            .send()
            .await?;
        let response = ensure_success(response, "event creation").await?;
        let envelope = decode::<EventEnvelope>(response, "created event").await?;
        debug!("Successfully created event with ID: {}", envelope.event.id);
        Ok(envelope.event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event, MispApiError> {
        debug!(event_id, "Retrieving event by ID from MISP");
        info!("Fetching event with ID: {}", event_id);

        let response = self
            .client
            .get(format!("{}/events/view/{}", self.base_url, event_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(MispApiError::EventNotFound(event_id.to_string()));
        }

        let response = ensure_success(response, "event lookup").await?;
        let envelope = decode::<EventEnvelope>(response, "event").await?;
        debug!("Successfully retrieved event {} from MISP", event_id);
        Ok(envelope.event)
    }

    pub async fn search_events(
        &self,
        query: &EventSearchQuery,
    ) -> Result<Vec<Event>, MispApiError> {
        debug!(limit = query.limit, "Searching events in MISP");

        // restSearch uses "from"/"to" for the date bounds.
        let mut body = json!({
            "returnFormat": "json",
            "limit": query.limit,
        });
        if let Some(date_from) = &query.date_from {
            body["from"] = json!(date_from);
        }
        if let Some(date_to) = &query.date_to {
            body["to"] = json!(date_to);
        }
        if let Some(org) = &query.org {
            body["org"] = json!(org);
        }
        if let Some(tags) = &query.tags {
            body["tags"] = json!(tags);
        }
        if let Some(threat_level) = query.threat_level {
            body["threat_level_id"] = json!(threat_level);
        }

        info!(
            "Executing restSearch for up to {} events from MISP",
            query.limit
        );

        let response = self
            .client
            .post(format!("{}/events/restSearch", self.base_url))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, "event search").await?;
        let search = decode::<SearchEventsResponse>(response, "event search results").await?;
        debug!(
            "Successfully retrieved {} events from MISP",
            search.response.len()
        );
        Ok(search.response.into_iter().map(|e| e.event).collect())
    }

    pub async fn add_attribute(
        &self,
        event_id: &str,
        attribute: NewAttribute,
    ) -> Result<Attribute, MispApiError> {
        debug!(event_id, attribute_type = %attribute.attribute_type, "Adding attribute to MISP event");
        info!(
            "Adding {} attribute to event {}",
            attribute.attribute_type, event_id
        );

        let response = self
            .client
            .post(format!("{}/attributes/add/{}", self.base_url, event_id))
            .json(&attribute)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(MispApiError::EventNotFound(event_id.to_string()));
        }

        let response = ensure_success(response, "attribute creation").await?;
        let envelope = decode::<AttributeEnvelope>(response, "created attribute").await?;
        debug!(
            "Successfully added attribute {} to event {}",
            envelope.attribute.id, event_id
        );
        Ok(envelope.attribute)
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>, MispApiError> {
        debug!("Retrieving feeds from MISP");

        let response = self
            .client
            .get(format!("{}/feeds/index", self.base_url))
            .send()
            .await?;
        let response = ensure_success(response, "feed listing").await?;
        let envelopes = decode::<Vec<FeedEnvelope>>(response, "feeds").await?;
        debug!("Successfully retrieved {} feeds from MISP", envelopes.len());
        Ok(envelopes.into_iter().map(|f| f.feed).collect())
    }
}

/// Maps non-success statuses onto the error taxonomy: 401/403 become
/// authentication failures, everything else an API error carrying a body
/// snippet for the failure report.
async fn ensure_success(response: Response, operation: &str) -> Result<Response, MispApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet = body_snippet(&body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MispApiError::AuthenticationError(
            format!("MISP rejected the API key ({}): {}", status, snippet),
        )),
        _ => Err(MispApiError::ApiError(format!(
            "{} failed with status {}: {}",
            operation, status, snippet
        ))),
    }
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    what: &str,
) -> Result<T, MispApiError> {
    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| {
        error!("Error deserializing {}: {}. Raw body: {}", what, e, body);
        MispApiError::ClientError(format!("Failed to deserialize {}: {}", what, e))
    })
}

fn body_snippet(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>";
    }
    let end = trimmed
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
